//! HTTP tests for the RPC boundary.
//!
//! Envelope handling and guard short-circuits: every failure here must come
//! back as `{code, message}` and fire before any handler logic runs.

mod helpers;

use axum::body::Body;
use axum::http::Method;
use helpers::{body_json, test_app, TestApp};
use serde_json::json;

fn rpc_request(body: serde_json::Value) -> axum::http::Request<Body> {
    TestApp::request(Method::POST, "/api/rpc")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_guarded_procedure_without_session_is_unauthorized() {
    let app = test_app();

    let resp = app
        .oneshot(rpc_request(json!({ "procedure": "post.list" })))
        .await;

    assert_eq!(resp.status(), 401);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_every_content_procedure_requires_a_session() {
    let app = test_app();

    for procedure in [
        "media.list",
        "media.get",
        "media.update",
        "media.delete",
        "post.create",
        "post.delete",
        "product.update",
        "category.create",
        "tag.delete",
        "language.list",
        "audit.list",
        "user.list",
        "user.set_role",
    ] {
        let resp = app
            .oneshot(rpc_request(json!({ "procedure": procedure, "input": {} })))
            .await;
        assert_eq!(resp.status(), 401, "procedure {procedure} leaked through");

        let body = body_json(resp).await;
        assert_eq!(body["code"], "UNAUTHORIZED", "procedure {procedure}");
    }
}

#[tokio::test]
async fn test_unknown_procedure_is_not_found() {
    let app = test_app();

    let resp = app
        .oneshot(rpc_request(json!({ "procedure": "page.render" })))
        .await;

    assert_eq!(resp.status(), 404);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_json_body_rejected() {
    let app = test_app();

    let req = TestApp::request(Method::POST, "/api/rpc")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_missing_procedure_field_rejected() {
    let app = test_app();

    let resp = app.oneshot(rpc_request(json!({ "input": {} }))).await;

    // axum's Json extractor rejects the envelope before dispatch.
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_unauthorized_in_rpc_shape() {
    let app = test_app();

    let req = TestApp::request(Method::POST, "/api/rpc")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer not-a-jwt")
        .body(Body::from(
            json!({ "procedure": "post.list" }).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}
