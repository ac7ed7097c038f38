use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use lead_intake::intake::{intake_router, AttachmentStore, IntakeService, LeadStore};

/// Wraps the public intake routes with the operational endpoints.
pub(crate) fn with_intake_routes<R, S>(service: Arc<IntakeService<R, S>>) -> axum::Router
where
    R: LeadStore + 'static,
    S: AttachmentStore + 'static,
{
    let limiter = Arc::clone(&service);
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route(
            "/metrics",
            axum::routing::get(move |state: Extension<AppState>| {
                metrics_endpoint(state, Arc::clone(&limiter))
            }),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint<R, S>(
    Extension(state): Extension<AppState>,
    service: Arc<IntakeService<R, S>>,
) -> impl IntoResponse
where
    R: LeadStore + 'static,
    S: AttachmentStore + 'static,
{
    metrics::gauge!("intake_rate_limiter_tracked_identities")
        .set(service.tracked_identities() as f64);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
