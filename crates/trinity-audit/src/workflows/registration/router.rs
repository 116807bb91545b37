use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApprovedCollegeFilter, CollegeId, CollegeRegistration};
use super::service::{RegistrationError, RegistrationService};
use crate::workflows::integrations::RepositoryError;
use crate::workflows::session::{authenticate, Principal, SessionVerifier};

/// Shared handler state for registration endpoints.
#[derive(Clone)]
pub struct RegistrationApiState {
    pub service: Arc<RegistrationService>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub expose_diagnostics: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    #[serde(default)]
    reason: String,
}

/// Router builder exposing college sign-up and the admin review queue.
pub fn registration_router(state: RegistrationApiState) -> Router {
    Router::new()
        .route("/api/v1/colleges/register", post(register_handler))
        .route("/api/v1/admin/colleges/pending", get(pending_handler))
        .route("/api/v1/admin/colleges/approved", get(approved_handler))
        .route(
            "/api/v1/admin/colleges/:college_id/approve",
            post(approve_handler),
        )
        .route(
            "/api/v1/admin/colleges/:college_id/reject",
            post(reject_handler),
        )
        .with_state(state)
}

pub(crate) async fn register_handler(
    State(state): State<RegistrationApiState>,
    Json(registration): Json<CollegeRegistration>,
) -> Response {
    match state.service.register(registration) {
        Ok(college) => (StatusCode::CREATED, Json(college)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn pending_handler(
    State(state): State<RegistrationApiState>,
    headers: HeaderMap,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.pending(&principal) {
        Ok(colleges) => (StatusCode::OK, Json(colleges)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn approved_handler(
    State(state): State<RegistrationApiState>,
    headers: HeaderMap,
    Query(filter): Query<ApprovedCollegeFilter>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.approved(&principal, &filter) {
        Ok(colleges) => (StatusCode::OK, Json(colleges)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn approve_handler(
    State(state): State<RegistrationApiState>,
    headers: HeaderMap,
    Path(college_id): Path<String>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.approve(&principal, &CollegeId(college_id)) {
        Ok(college) => (StatusCode::OK, Json(college)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn reject_handler(
    State(state): State<RegistrationApiState>,
    headers: HeaderMap,
    Path(college_id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state
        .service
        .reject(&principal, &CollegeId(college_id), &request.reason)
    {
        Ok(college) => (StatusCode::OK, Json(college)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

fn caller(state: &RegistrationApiState, headers: &HeaderMap) -> Result<Principal, Response> {
    authenticate(state.sessions.as_ref(), headers).map_err(|err| {
        let payload = json!({ "error": err.to_string(), "kind": "unauthorized" });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    })
}

fn error_response(err: &RegistrationError, expose_diagnostics: bool) -> Response {
    let (status, kind) = match err {
        RegistrationError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        RegistrationError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        RegistrationError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        RegistrationError::NotPending { .. } => (StatusCode::CONFLICT, "conflict"),
        RegistrationError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, "conflict")
        }
        RegistrationError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        RegistrationError::Repository(RepositoryError::Unavailable(_)) => {
            tracing::error!(error = %err, "registration repository failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    };

    let mut payload = json!({ "error": err.to_string(), "kind": kind });
    if expose_diagnostics {
        payload["detail"] = json!(format!("{err:?}"));
    }
    (status, Json(payload)).into_response()
}
