//! HTTP surface for the intake pipeline.
//!
//! Every response is a JSON envelope with an `ok` flag. Internal failure
//! detail is logged server-side only; callers never see storage error text.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use super::domain::{IntakePayload, UploadPayload};
use super::repository::{AttachmentStore, LeadStore};
use super::service::{IntakeError, IntakeService, UploadError};

/// Builds the public intake router over an orchestrating service.
pub fn intake_router<R, S>(service: Arc<IntakeService<R, S>>) -> Router
where
    R: LeadStore + 'static,
    S: AttachmentStore + 'static,
{
    // Base64 inflates the raw bytes by 4/3; the limit leaves headroom for
    // the JSON envelope so the decoded-size check in the service stays the
    // gate that rejects oversized files.
    let upload_body_limit = service.max_upload_bytes() / 3 * 4 + 64 * 1024;
    Router::new()
        .route("/api/v1/intake", post(intake_handler::<R, S>))
        .route(
            "/api/v1/upload",
            post(upload_handler::<R, S>).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .with_state(service)
}

/// Caller identity from the first forwarded-for hop, `"unknown"` otherwise.
pub fn caller_context(headers: &HeaderMap) -> super::service::CallerContext {
    let identity = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);

    super::service::CallerContext {
        identity,
        user_agent,
    }
}

async fn intake_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    headers: HeaderMap,
    payload: Result<Json<IntakePayload>, JsonRejection>,
) -> Response
where
    R: LeadStore + 'static,
    S: AttachmentStore + 'static,
{
    let caller = caller_context(&headers);

    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid request body"),
    };

    match service.submit(payload, &caller, Utc::now()) {
        Ok(accepted) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "lead_id": accepted.lead_id,
                "priority_score": accepted.priority_score,
            })),
        )
            .into_response(),
        Err(err) => intake_error_response(err),
    }
}

async fn upload_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    payload: Result<Json<UploadPayload>, JsonRejection>,
) -> Response
where
    R: LeadStore + 'static,
    S: AttachmentStore + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid request body"),
    };

    match service.upload(payload, Utc::now()) {
        Ok(accepted) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "file_id": accepted.file_id,
                "storage_path": accepted.storage_path,
                "signed_url": accepted.signed_url,
            })),
        )
            .into_response(),
        Err(err) => upload_error_response(err),
    }
}

fn intake_error_response(err: IntakeError) -> Response {
    match err {
        IntakeError::RateLimited => error_response(StatusCode::TOO_MANY_REQUESTS, &err.to_string()),
        IntakeError::MissingField(_) | IntakeError::InvalidField(_) => {
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        IntakeError::Store(source) => {
            error!(error = %source, "lead persistence failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create lead")
        }
    }
}

fn upload_error_response(err: UploadError) -> Response {
    match err {
        UploadError::MissingField(_)
        | UploadError::InvalidLeadId
        | UploadError::DisallowedMimeType
        | UploadError::InvalidEncoding(_)
        | UploadError::TooLarge { .. } => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        UploadError::LeadNotFound => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        UploadError::Store(source) => {
            error!(error = %source, "upload lead lookup or metadata failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload file")
        }
        UploadError::Storage(source) => {
            error!(error = %source, "attachment storage failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload file")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn caller_identity_is_the_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("intake-form/2.1"));

        let caller = caller_context(&headers);
        assert_eq!(caller.identity, "203.0.113.7");
        assert_eq!(caller.user_agent.as_deref(), Some("intake-form/2.1"));
    }

    #[test]
    fn missing_forwarded_header_collapses_to_unknown() {
        let caller = caller_context(&HeaderMap::new());
        assert_eq!(caller.identity, "unknown");
        assert!(caller.user_agent.is_none());
    }

    #[test]
    fn blank_forwarded_header_collapses_to_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        let caller = caller_context(&headers);
        assert_eq!(caller.identity, "unknown");
    }
}
