//! Attachment payload handling: MIME allow-list, base64 decoding, filename
//! sanitization, and storage-path construction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use super::domain::LeadId;

/// Image types accepted from the public upload endpoint. Everything else is
/// rejected to keep the bucket from becoming arbitrary file storage.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

pub fn mime_allowed(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// Decodes base64 file content, tolerating an optional `data:` URL prefix.
pub fn decode_file_data(file_data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let raw = file_data
        .split_once(',')
        .map(|(_, body)| body)
        .unwrap_or(file_data);
    STANDARD.decode(raw.trim())
}

/// Replaces anything outside `[A-Za-z0-9._-]` so client-supplied names
/// cannot smuggle separators or control characters into storage paths.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Deterministic object path: `leads/<lead_id>/<timestamp_millis>_<name>`.
///
/// The lead-id prefix groups every attachment of a lead for listing and
/// audit; the millisecond timestamp keeps concurrent uploads from
/// colliding.
pub fn storage_path(lead_id: LeadId, file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "leads/{}/{}_{}",
        lead_id,
        now.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn allow_list_accepts_images_only() {
        assert!(mime_allowed("image/jpeg"));
        assert!(mime_allowed("image/heif"));
        assert!(!mime_allowed("application/pdf"));
        assert!(!mime_allowed("image/svg+xml"));
        assert!(!mime_allowed("text/html"));
    }

    #[test]
    fn decodes_bare_and_data_url_payloads() {
        let bytes = decode_file_data("aGVsbG8=").expect("bare base64");
        assert_eq!(bytes, b"hello");

        let bytes =
            decode_file_data("data:image/jpeg;base64,aGVsbG8=").expect("data-url base64");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn rejects_garbage_payloads() {
        assert!(decode_file_data("not!!valid@@base64").is_err());
    }

    #[test]
    fn sanitizes_hostile_file_names() {
        assert_eq!(
            sanitize_file_name("../../etc/passwd"),
            ".._.._etc_passwd"
        );
        assert_eq!(sanitize_file_name("photo fa\u{e7}ade.jpg"), "photo_fa_ade.jpg");
        assert_eq!(sanitize_file_name("IMG_2024-01.jpeg"), "IMG_2024-01.jpeg");
    }

    #[test]
    fn storage_path_is_lead_scoped() {
        let lead_id = LeadId::new();
        let now = Utc
            .with_ymd_and_hms(2025, 5, 12, 9, 30, 0)
            .single()
            .expect("valid timestamp");
        let path = storage_path(lead_id, "kitchen photo.jpg", now);
        assert!(path.starts_with(&format!("leads/{lead_id}/")));
        assert!(path.ends_with("_kitchen_photo.jpg"));
        assert!(path.contains(&now.timestamp_millis().to_string()));
    }
}
