//! Data model for the intake pipeline: leads, attachments, audit events, and
//! the raw submission payloads accepted at the HTTP boundary.
//!
//! Inbound payloads deliberately keep every field as an optional/defaulted
//! string so the orchestrator can run exhaustive presence checks and answer
//! with the first missing field, instead of leaking deserializer errors to
//! callers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, immutable lead identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub Uuid);

impl LeadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LeadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LeadId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Identifier for one uploaded attachment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadFileId(pub Uuid);

impl LeadFileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LeadFileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeadFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier for one audit-trail entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadEventId(pub Uuid);

impl LeadEventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LeadEventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Site languages served by the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "FR")]
    Fr,
    #[serde(rename = "NL")]
    Nl,
}

impl FromStr for Language {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FR" => Ok(Self::Fr),
            "NL" => Ok(Self::Nl),
            _ => Err(UnknownVariant),
        }
    }
}

/// Canonical urgency tiers.
///
/// `48H` is a client-observable synonym for `H48`; the lowercase aliases come
/// from the onboarding form's internal values. All of them collapse into the
/// three canonical variants here, so downstream consumers only ever see
/// `IMMEDIATE | H48 | INSPECTION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "IMMEDIATE")]
    Immediate,
    #[serde(rename = "H48", alias = "48H")]
    H48,
    #[serde(rename = "INSPECTION")]
    Inspection,
}

impl FromStr for Urgency {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IMMEDIATE" | "TODAY" => Ok(Self::Immediate),
            "H48" | "48H" => Ok(Self::H48),
            "INSPECTION" | "WEEK" => Ok(Self::Inspection),
            _ => Err(UnknownVariant),
        }
    }
}

/// How the requester wants to be contacted back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactMethod {
    Whatsapp,
    Call,
    Online,
}

impl FromStr for ContactMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WHATSAPP" => Ok(Self::Whatsapp),
            "CALL" | "PHONE" => Ok(Self::Call),
            "ONLINE" | "EMAIL" => Ok(Self::Online),
            _ => Err(UnknownVariant),
        }
    }
}

/// Lead lifecycle status. `NEW`/`SPAM` is assigned by the orchestrator at
/// creation; every later transition is operator-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Scheduled,
    Done,
    Lost,
    Spam,
}

/// Raised when a closed-set field carries a value outside its variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownVariant;

/// One pest-control service request as persisted in the lead store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub created_at: DateTime<Utc>,
    pub lang: Language,
    pub source: String,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub pest_category: String,
    pub pest_detail: String,
    pub urgency: Urgency,
    pub postal_code: String,
    pub city: String,
    pub description: String,
    pub contact_method: ContactMethod,
    /// Always stored whitespace-stripped in international form.
    pub phone: String,
    pub status: LeadStatus,
    /// Set once at creation, never recomputed.
    pub priority_score: u32,
    /// Set once at creation, never recomputed.
    pub sla_due_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub assignee: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One uploaded attachment bound to a lead. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadFile {
    pub id: LeadFileId,
    pub lead_id: LeadId,
    /// Unique path encoding the owning lead id for prefix-based listing.
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit-trail entry. `actor` is `None` for system events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadEvent {
    pub id: LeadEventId,
    pub lead_id: LeadId,
    pub actor: Option<String>,
    pub event_type: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Untrusted intake submission as received from the public endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakePayload {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub pest_category: String,
    #[serde(default)]
    pub pest_detail: String,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact_method: String,
    #[serde(default)]
    pub phone: String,
    /// Honeypot. Invisible to humans; any content is a near-certain bot.
    #[serde(default)]
    pub hp: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Client-reported form-start time. Client-controlled, so it only ever
    /// adds suspicion; a forged value merely loses the timing signal.
    #[serde(default)]
    pub form_started_at: Option<DateTime<Utc>>,
}

/// Untrusted attachment upload request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadPayload {
    #[serde(default)]
    pub lead_id: String,
    #[serde(default)]
    pub file_name: String,
    /// Base64 content, optionally with a `data:` URL prefix.
    #[serde(default)]
    pub file_data: String,
    #[serde(default)]
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_synonyms_collapse_to_canonical_variants() {
        assert_eq!("48H".parse::<Urgency>(), Ok(Urgency::H48));
        assert_eq!("48h".parse::<Urgency>(), Ok(Urgency::H48));
        assert_eq!("H48".parse::<Urgency>(), Ok(Urgency::H48));
        assert_eq!("immediate".parse::<Urgency>(), Ok(Urgency::Immediate));
        assert_eq!("today".parse::<Urgency>(), Ok(Urgency::Immediate));
        assert_eq!("week".parse::<Urgency>(), Ok(Urgency::Inspection));
        assert_eq!("yesterday".parse::<Urgency>(), Err(UnknownVariant));
    }

    #[test]
    fn urgency_serializes_canonically() {
        let json = serde_json::to_string(&Urgency::H48).expect("serializes");
        assert_eq!(json, "\"H48\"");
        let parsed: Urgency = serde_json::from_str("\"48H\"").expect("alias accepted");
        assert_eq!(parsed, Urgency::H48);
    }

    #[test]
    fn contact_method_accepts_form_aliases() {
        assert_eq!("phone".parse::<ContactMethod>(), Ok(ContactMethod::Call));
        assert_eq!("email".parse::<ContactMethod>(), Ok(ContactMethod::Online));
        assert_eq!(
            "WHATSAPP".parse::<ContactMethod>(),
            Ok(ContactMethod::Whatsapp)
        );
    }

    #[test]
    fn intake_payload_tolerates_missing_fields() {
        let payload: IntakePayload = serde_json::from_str("{}").expect("all fields defaulted");
        assert!(payload.lang.is_empty());
        assert!(payload.hp.is_none());
        assert!(payload.form_started_at.is_none());
    }
}
