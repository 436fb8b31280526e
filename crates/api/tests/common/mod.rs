//! Common test utilities for integration tests.
//!
//! Builds the full router over the in-memory complaint store, a fixed clock,
//! a recording notifier and a temporary upload directory, and signs HS256
//! actor tokens with the test secret.

// Not every integration test uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use campuswatch_api::{
    app::{create_app, AppState},
    config::Config,
};
use chrono::{TimeZone, Utc};
use domain::services::{
    ComplaintLifecycleEngine, FixedClock, InMemoryComplaintStore, MockNotificationService,
};
use persistence::FsBlobStore;
use serde_json::{json, Value};
use shared::jwt::TokenVerifier;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub engine: ComplaintLifecycleEngine,
    pub clock: Arc<FixedClock>,
    pub notifier: Arc<MockNotificationService>,
    pub upload_dir: PathBuf,
    issuer: TokenVerifier,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_overrides(&[])
    }

    pub fn with_overrides(overrides: &[(&str, &str)]) -> Self {
        let upload_dir = std::env::temp_dir().join(format!("cw-test-uploads-{}", Uuid::new_v4()));
        let upload_dir_str = upload_dir.to_string_lossy().to_string();

        let mut all: Vec<(&str, &str)> = vec![("uploads.dir", upload_dir_str.as_str())];
        all.extend_from_slice(overrides);
        let config = Config::load_for_test(&all).expect("Failed to load test config");

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(MockNotificationService::new());
        let engine = ComplaintLifecycleEngine::new(
            Arc::new(InMemoryComplaintStore::new()),
            notifier.clone(),
            clock.clone(),
        );
        let blobs = Arc::new(FsBlobStore::new(&upload_dir));

        let state = AppState::new(config, engine.clone(), blobs, None)
            .expect("Failed to build app state");

        Self {
            router: create_app(state),
            engine,
            clock,
            notifier,
            upload_dir,
            issuer: TokenVerifier::from_secret(TEST_SECRET, 0).expect("Failed to build issuer"),
        }
    }

    /// Signs a token the way the identity provider would.
    pub fn token(&self, actor_id: &str, role: &str) -> String {
        self.issuer
            .issue(actor_id, role, 900)
            .expect("Failed to issue token")
    }

    pub fn student(&self, id: &str) -> String {
        self.token(id, "student")
    }

    pub fn committee(&self) -> String {
        self.token("com-1", "committee")
    }

    pub fn admin(&self) -> String {
        self.token("adm-1", "admin")
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    /// Sends and returns the status with the parsed JSON body.
    pub async fn call(&self, request: Request<Body>) -> (axum::http::StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, parse_response_body(response).await)
    }

    /// Submits a public Infrastructure complaint and returns its id.
    pub async fn submit(&self, token: &str, title: &str) -> Uuid {
        self.submit_with(token, complaint_body(title)).await
    }

    pub async fn submit_with(&self, token: &str, body: Value) -> Uuid {
        let (status, json) = self
            .call(json_request_with_auth(
                Method::POST,
                "/api/v1/complaints",
                body,
                token,
            ))
            .await;
        assert_eq!(status, axum::http::StatusCode::CREATED, "{json}");
        json["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("Response carries an id")
    }

    /// Posts an action with an optional JSON body.
    pub async fn act(
        &self,
        token: &str,
        id: Uuid,
        action: &str,
        body: Option<Value>,
    ) -> (axum::http::StatusCode, Value) {
        let uri = format!("/api/v1/complaints/{}/{}", id, action);
        let request = match body {
            Some(body) => json_request_with_auth(Method::POST, &uri, body, token),
            None => post_request_with_auth(&uri, token),
        };
        self.call(request).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub fn complaint_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Noticed on the way to class this morning",
        "category": "Infrastructure",
        "department": "Civil Engineering",
        "location": "Block A"
    })
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a bodiless POST request with authentication.
pub fn post_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request without authentication.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
