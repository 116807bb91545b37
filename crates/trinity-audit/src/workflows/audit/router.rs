use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{AuditId, SaveIntent};
use super::sections::{SectionData, SectionKey, ValidationIssue};
use super::service::{AuditService, AuditServiceError, AuditTarget, ReviewRequest, SectionSave};
use super::status::AuditStatus;
use super::uploads::FileUpload;
use crate::workflows::session::{authenticate, Principal, SessionVerifier};

/// Shared handler state for audit endpoints.
#[derive(Clone)]
pub struct AuditApiState {
    pub service: Arc<AuditService>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub expose_diagnostics: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAuditRequest {
    academic_year: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionSaveBody {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    intent: SaveIntent,
    #[serde(default)]
    base_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadQuery {
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    submit: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewQueueQuery {
    status: Option<String>,
}

/// Router builder exposing the audit wizard, submission, and admin review.
pub fn audit_router(state: AuditApiState) -> Router {
    let body_limit = state
        .service
        .settings()
        .uploads
        .max_pdf_bytes
        .max(state.service.settings().uploads.max_document_bytes);

    Router::new()
        .route("/api/v1/audits", post(create_handler).get(list_mine_handler))
        .route(
            "/api/v1/audits/:audit_id",
            get(fetch_handler).delete(delete_handler),
        )
        .route(
            "/api/v1/audits/:audit_id/sections/:section",
            put(save_by_id_handler),
        )
        .route(
            "/api/v1/audits/:audit_id/sections/:section/documents",
            post(document_handler),
        )
        .route("/api/v1/audits/:audit_id/completion", get(completion_handler))
        .route("/api/v1/audits/:audit_id/submit", post(submit_handler))
        .route("/api/v1/academic-years/:year/audit", get(open_handler))
        .route(
            "/api/v1/academic-years/:year/audit/sections/:section",
            put(save_by_year_handler),
        )
        .route("/api/v1/academic-years/:year/audit/pdf", post(pdf_handler))
        .route("/api/v1/admin/audits", get(review_queue_handler))
        .route("/api/v1/admin/audits/export", get(export_handler))
        .route(
            "/api/v1/admin/audits/:audit_id/review",
            post(review_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub(crate) async fn create_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateAuditRequest>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.create(&principal, &request.academic_year) {
        Ok(audit) => (StatusCode::CREATED, Json(audit)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn list_mine_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.list_mine(&principal) {
        Ok(audits) => {
            let summaries: Vec<_> = audits.iter().map(|audit| audit.summary()).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn fetch_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(audit_id): Path<String>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.get(&principal, &AuditId(audit_id)) {
        Ok(audit) => (StatusCode::OK, Json(audit)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn delete_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(audit_id): Path<String>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.delete(&principal, &AuditId(audit_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn open_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(year): Path<String>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.open(&principal, &year) {
        Ok(audit) => (StatusCode::OK, Json(audit)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn save_by_id_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path((audit_id, section)): Path<(String, String)>,
    Json(body): Json<SectionSaveBody>,
) -> Response {
    save_section(state, headers, AuditTarget::Id(AuditId(audit_id)), section, body)
}

pub(crate) async fn save_by_year_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path((year, section)): Path<(String, String)>,
    Json(body): Json<SectionSaveBody>,
) -> Response {
    save_section(state, headers, AuditTarget::Year(year), section, body)
}

fn save_section(
    state: AuditApiState,
    headers: HeaderMap,
    target: AuditTarget,
    section: String,
    body: SectionSaveBody,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let data = match parse_section(&section, body.data) {
        Ok(data) => data,
        Err(err) => return error_response(&err, state.expose_diagnostics),
    };
    let request = SectionSave {
        target,
        data,
        intent: body.intent,
        base_revision: body.base_revision,
    };

    match state.service.save_section(&principal, request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn document_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path((audit_id, section)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let key = match section.parse::<SectionKey>() {
        Ok(key) => key,
        Err(err) => return error_response(&unknown_section(err), state.expose_diagnostics),
    };
    let upload = FileUpload {
        file_name: query.file_name,
        bytes: bytes.to_vec(),
    };

    match state
        .service
        .upload_section_document(&principal, &AuditId(audit_id), key, upload)
    {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn pdf_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(year): Path<String>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let upload = FileUpload {
        file_name: query.file_name,
        bytes: bytes.to_vec(),
    };

    match state
        .service
        .upload_direct_pdf(&principal, &year, upload, query.submit)
    {
        Ok(audit) => (StatusCode::OK, Json(audit)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn completion_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(audit_id): Path<String>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.completion(&principal, &AuditId(audit_id)) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn submit_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(audit_id): Path<String>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.submit(&principal, &AuditId(audit_id)) {
        Ok(audit) => (StatusCode::OK, Json(audit)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn review_queue_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Query(query): Query<ReviewQueueQuery>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => match AuditStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let err = AuditServiceError::Validation {
                    message: format!("unknown audit status '{raw}'"),
                    issues: vec![ValidationIssue::error("status", "unknown audit status")],
                };
                return error_response(&err, state.expose_diagnostics);
            }
        },
    };

    match state.service.list_for_review(&principal, status) {
        Ok(audits) => {
            let summaries: Vec<_> = audits.iter().map(|audit| audit.summary()).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn review_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
    Path(audit_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.review(&principal, &AuditId(audit_id), request) {
        Ok(audit) => (StatusCode::OK, Json(audit)).into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

pub(crate) async fn export_handler(
    State(state): State<AuditApiState>,
    headers: HeaderMap,
) -> Response {
    let principal = match caller(&state, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.service.export_register(&principal) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"audit-register.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => error_response(&err, state.expose_diagnostics),
    }
}

fn caller(state: &AuditApiState, headers: &HeaderMap) -> Result<Principal, Response> {
    authenticate(state.sessions.as_ref(), headers)
        .map_err(|err| error_response(&AuditServiceError::from(err), state.expose_diagnostics))
}

fn parse_section(section: &str, data: Value) -> Result<SectionData, AuditServiceError> {
    let key = section.parse::<SectionKey>().map_err(unknown_section)?;
    let data = if data.is_null() { json!({}) } else { data };
    SectionData::parse(key, data).map_err(|err| AuditServiceError::Validation {
        message: format!("{} payload is malformed", key.label()),
        issues: vec![ValidationIssue::error("data", err.to_string())],
    })
}

fn unknown_section(err: impl ToString) -> AuditServiceError {
    AuditServiceError::Validation {
        message: err.to_string(),
        issues: vec![ValidationIssue::error("section", err.to_string())],
    }
}

fn error_response(err: &AuditServiceError, expose_diagnostics: bool) -> Response {
    let (status, kind) = match err {
        AuditServiceError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        AuditServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        AuditServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        AuditServiceError::Validation { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
        }
        AuditServiceError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
        AuditServiceError::InvalidTransition(_) => (StatusCode::CONFLICT, "invalid_transition"),
        AuditServiceError::AlreadySubmitted => (StatusCode::CONFLICT, "already_submitted"),
        AuditServiceError::AlreadyApproved => (StatusCode::CONFLICT, "already_approved"),
        AuditServiceError::IncompleteAudit { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "incomplete_audit")
        }
        AuditServiceError::Repository(_)
        | AuditServiceError::Storage(_)
        | AuditServiceError::Export(_) => {
            tracing::error!(error = %err, "audit workflow failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    };

    let mut payload = json!({ "error": err.to_string(), "kind": kind });
    match err {
        AuditServiceError::Validation { issues, .. } => payload["issues"] = json!(issues),
        AuditServiceError::Conflict {
            existing: Some(existing),
            ..
        } => payload["existing"] = json!(existing),
        AuditServiceError::IncompleteAudit { missing } => payload["missing"] = json!(missing),
        _ => {}
    }
    if expose_diagnostics {
        payload["detail"] = json!(format!("{err:?}"));
    }
    (status, Json(payload)).into_response()
}
