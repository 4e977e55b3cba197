//! HTTP tests for the authentication boundary.
//!
//! These cover rejection paths that must fire before any handler logic or
//! database access.

mod helpers;

use axum::body::Body;
use axum::http::Method;
use helpers::{body_json, test_app, TestApp};

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();

    let req = TestApp::request(Method::GET, "/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 200);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_me_without_token_is_unauthenticated() {
    let app = test_app();

    let req = TestApp::request(Method::GET, "/auth/me")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "MISSING_AUTH");
}

#[tokio::test]
async fn test_me_with_malformed_header_rejected() {
    let app = test_app();

    let req = TestApp::request(Method::GET, "/auth/me")
        .header("Authorization", "Token abc")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "INVALID_AUTH_HEADER");
}

#[tokio::test]
async fn test_me_with_garbage_token_rejected() {
    let app = test_app();

    let req = TestApp::request(Method::GET, "/auth/me")
        .header("Authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let app = test_app();

    // Valid JWT shape, wrong key.
    let token =
        pepper_server::auth::jwt::generate_access_token(uuid::Uuid::now_v7(), "other-secret", 60)
            .unwrap();
    assert_ne!(app.config.jwt_secret, "other-secret");

    let req = TestApp::request(Method::GET, "/auth/me")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
}
