//! End-to-end identity service tests over the in-process router.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tst_gateway::auth::{api, AuthState, TokenCodec, UserStore};
use tst_gateway::config::TrustDomain;

const TEST_SECRET: &str = "identity-test-secret";

fn test_router() -> (Router, Arc<TokenCodec>) {
    let trust = TrustDomain::new(TEST_SECRET.to_string(), Algorithm::HS256);
    let codec = Arc::new(TokenCodec::new(&trust, 60));
    let state = AuthState::new(Arc::new(UserStore::new()), codec.clone());
    (api::router(state), codec)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn register_login_me_end_to_end() {
    let (app, _) = test_router();

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        Some(json!({ "username": "alice", "password": "pw123", "role": "staff" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "registered");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "staff");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({ "username": "alice", "password": "pw123" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "staff");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, _) = test_router();

    let payload = json!({ "username": "alice", "password": "pw123", "role": "staff" });

    let (status, _) = send(&app, "POST", "/auth/register", Some(payload.clone()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/auth/register", Some(payload), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "username already exists");
}

#[tokio::test]
async fn empty_fields_are_rejected() {
    let (app, _) = test_router();

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        Some(json!({ "username": "", "password": "pw", "role": "staff" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        Some(json!({ "username": "alice", "password": "pw", "role": " " })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (app, _) = test_router();

    send(
        &app,
        "POST",
        "/auth/register",
        Some(json!({ "username": "alice", "password": "correct", "role": "staff" })),
        None,
    )
    .await;

    // Wrong password for a real user.
    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({ "username": "alice", "password": "wrong" })),
        None,
    )
    .await;

    // Login for a user that does not exist.
    let (missing_status, missing_body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({ "username": "nobody", "password": "whatever" })),
        None,
    )
    .await;

    // Same status, same body shape: no username enumeration.
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, missing_body);
    assert_eq!(wrong_body["detail"], "invalid credentials");
}

#[tokio::test]
async fn missing_authorization_header_is_rejected() {
    let (app, _) = test_router();

    let (status, body) = send(&app, "GET", "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Missing/invalid Authorization header");
}

#[tokio::test]
async fn expired_token_reads_expired() {
    let (app, codec) = test_router();

    let token = codec
        .issue_with_ttl("alice", Some("staff"), Duration::seconds(-10))
        .unwrap();

    let (status, body) = send(&app, "GET", "/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token expired");
}

#[tokio::test]
async fn tampered_token_reads_invalid_never_expired() {
    let (app, codec) = test_router();

    let token = codec.issue("alice", Some("staff")).unwrap();

    // Flip one character in the signature segment.
    let mut parts: Vec<String> = token.split('.').map(|s| s.to_string()).collect();
    let sig = parts.last_mut().unwrap();
    let flipped = if sig.ends_with('A') { 'B' } else { 'A' };
    sig.pop();
    sig.push(flipped);
    let tampered = parts.join(".");

    let (status, body) = send(&app, "GET", "/auth/me", None, Some(&tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token");
}

#[tokio::test]
async fn health_and_banner() {
    let (app, _) = test_router();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "identity");

    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Identity"));
}
