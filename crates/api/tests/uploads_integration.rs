//! Integration tests for blob uploads and the public health endpoints.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{get_request, get_request_with_auth, parse_response_body, TestApp};
use serde_json::json;

fn upload_request(uri: &str, bytes: &'static [u8], token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(bytes))
        .unwrap()
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_then_fetch() {
    let app = TestApp::new();
    let token = app.student("stu-1");

    let (status, json) = app
        .call(upload_request(
            "/api/v1/uploads?name=broken%20fan.png",
            b"\x89PNG fan",
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["size"], 8);
    let reference = json["reference"].as_str().unwrap().to_string();
    assert!(reference.ends_with("-broken_fan.png"));

    let response = app
        .send(get_request_with_auth(
            &format!("/api/v1/uploads/{}", reference),
            &app.student("stu-2"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"\x89PNG fan");
}

#[tokio::test]
async fn test_upload_reference_attached_to_complaint() {
    let app = TestApp::new();
    let token = app.student("stu-1");

    let (_, uploaded) = app
        .call(upload_request("/api/v1/uploads?name=leak.jpg", b"jpeg", &token))
        .await;
    let reference = uploaded["reference"].as_str().unwrap().to_string();

    let mut body = common::complaint_body("Leaking pipe");
    body["image"] = json!(reference);
    let id = app.submit_with(&token, body).await;

    let (status, json) = app
        .call(get_request_with_auth(
            &format!("/api/v1/complaints/{}", id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["image"], json!(reference));
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let app = TestApp::new();
    let (status, json) = app
        .call(upload_request("/api/v1/uploads", b"", &app.student("stu-1")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let app = TestApp::with_overrides(&[("uploads.max_bytes", "4")]);
    let response = app
        .send(upload_request(
            "/api/v1/uploads?name=big.bin",
            b"too many bytes",
            &app.student("stu-1"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads")
        .body(Body::from("bytes"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_fetch_unknown_blob() {
    let app = TestApp::new();
    let token = app.student("stu-1");

    let (status, _) = app
        .call(get_request_with_auth(
            "/api/v1/uploads/00000000-0000-0000-0000-000000000000-none.png",
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let app = TestApp::new();
    let (status, json) = app.call(get_request("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["storage"]["backend"], "memory");
    assert_eq!(json["storage"]["connected"], true);
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let app = TestApp::new();

    let (status, json) = app.call(get_request("/api/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "alive");

    let (status, json) = app.call(get_request("/api/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    campuswatch_api::middleware::init_metrics().unwrap();
    let app = TestApp::new();
    let token = app.student("stu-1");
    app.submit(&token, "Flickering lights").await;

    let response = app.send(get_request("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    // Prometheus text is not JSON.
    assert!(body.is_null());
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/health/live")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-42"
    );
}
