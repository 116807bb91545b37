use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;

fn authed(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
}

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    authed(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn requests_without_a_session_are_unauthorized() {
    let router = router_for(harness());

    let response = router
        .oneshot(
            Request::get("/api/v1/academic-years/2024-25/audit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "unauthorized");
}

#[tokio::test]
async fn section_save_by_year_returns_the_audit_and_warnings() {
    let router = router_for(harness());

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/academic-years/2024-25/audit/sections/academicPrograms",
            COLLEGE_TOKEN,
            json!({ "data": academic_programs(), "intent": "saveAndContinue" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["audit"]["status"], "draft");
    assert_eq!(payload["audit"]["currentStep"], 2);
    assert_eq!(
        payload["audit"]["sections"]["academicPrograms"]["totalIntake"],
        240
    );
    assert!(payload["warnings"].is_array());
}

#[tokio::test]
async fn unknown_sections_are_unprocessable() {
    let router = router_for(harness());

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/academic-years/2024-25/audit/sections/hostel",
            COLLEGE_TOKEN,
            json!({ "data": {} }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn validation_failures_carry_field_issues() {
    let router = router_for(harness());

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/academic-years/2024-25/audit/sections/grievanceRedressal",
            COLLEGE_TOKEN,
            json!({ "data": { "grievancesReceived": 2, "grievancesResolved": 5 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "validation_error");
    assert_eq!(payload["issues"][0]["field"], "grievancesResolved");
    assert!(payload.get("detail").is_none());
}

#[tokio::test]
async fn duplicate_create_returns_the_existing_reference() {
    let harness = harness();
    let existing = harness.service.create(&college(), YEAR).expect("creates");
    let router = router_for(harness);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/audits",
            COLLEGE_TOKEN,
            json!({ "academicYear": YEAR }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["existing"]["id"], existing.id.0);
    assert_eq!(payload["existing"]["status"], "draft");
}

#[tokio::test]
async fn incomplete_submission_lists_missing_sections() {
    let harness = harness();
    let audit = save_for_year(&harness.service, &college(), accreditation()).audit;
    let router = router_for(harness);

    let response = router
        .oneshot(
            authed(
                "POST",
                &format!("/api/v1/audits/{}/submit", audit.id),
                COLLEGE_TOKEN,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "incomplete_audit");
    assert_eq!(
        payload["missing"],
        json!(["Academic Programs", "Teachers Availability"])
    );
}

#[tokio::test]
async fn second_submit_is_a_conflict() {
    let harness = harness();
    let audit = core_complete_audit(&harness.service, &college());
    harness.service.submit(&college(), &audit.id).expect("submits");
    let router = router_for(harness);

    let response = router
        .oneshot(
            authed(
                "POST",
                &format!("/api/v1/audits/{}/submit", audit.id),
                COLLEGE_TOKEN,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "already_submitted");
}

#[tokio::test]
async fn foreign_audits_are_forbidden() {
    let harness = harness();
    let audit = save_for_year(&harness.service, &college(), accreditation()).audit;
    let router = router_for(harness);

    let response = router
        .oneshot(
            authed(
                "GET",
                &format!("/api/v1/audits/{}", audit.id),
                OTHER_COLLEGE_TOKEN,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn pdf_upload_can_submit_in_one_request() {
    let router = router_for(harness());

    let response = router
        .oneshot(
            authed(
                "POST",
                "/api/v1/academic-years/2024-25/audit/pdf?fileName=audit.pdf&submit=true",
                COLLEGE_TOKEN,
            )
            .header(header::CONTENT_TYPE, "application/pdf")
            .body(Body::from("%PDF-1.7 audit"))
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "submitted");
    assert_eq!(payload["directPDFUpload"]["uploaded"], true);
}

#[tokio::test]
async fn admin_review_and_export_routes() {
    let harness = harness();
    let audit = core_complete_audit(&harness.service, &college());
    harness.service.submit(&college(), &audit.id).expect("submits");
    let router = router_for(harness);

    let response = router
        .clone()
        .oneshot(
            authed("GET", "/api/v1/admin/audits?status=submitted", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let queue = read_json_body(response).await;
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/admin/audits/{}/review", audit.id),
            ADMIN_TOKEN,
            json!({ "decision": "reject", "comments": "Library data missing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reviewed = read_json_body(response).await;
    assert_eq!(reviewed["status"], "rejected");
    assert_eq!(reviewed["reviewComments"], "Library data missing");

    let response = router
        .oneshot(
            authed("GET", "/api/v1/admin/audits/export", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
}

#[tokio::test]
async fn unknown_review_status_filter_is_rejected() {
    let router = router_for(harness());

    let response = router
        .oneshot(
            authed("GET", "/api/v1/admin/audits?status=archived", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
