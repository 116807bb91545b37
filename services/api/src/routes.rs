use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use trinity_audit::workflows::audit::{audit_router, AuditApiState};
use trinity_audit::workflows::registration::{registration_router, RegistrationApiState};

pub(crate) fn with_workflow_routes(services: &Services, expose_diagnostics: bool) -> Router {
    let audits = audit_router(AuditApiState {
        service: services.audits.clone(),
        sessions: services.sessions.clone(),
        expose_diagnostics,
    });
    let registrations = registration_router(RegistrationApiState {
        service: services.registrations.clone(),
        sessions: services.sessions.clone(),
        expose_diagnostics,
    });

    audits
        .merge(registrations)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
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

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
