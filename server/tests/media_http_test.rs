//! HTTP tests for the media upload/download boundary.
//!
//! Object storage is not configured in the test app, and there is no live
//! database; these tests pin the rejection order — authentication fires
//! before permissions, storage checks and any handler logic.

mod helpers;

use axum::body::Body;
use axum::http::Method;
use helpers::{body_json, multipart_file_body, test_app, TestApp};

#[tokio::test]
async fn test_upload_without_session_rejected_before_handler() {
    let app = test_app();

    let boundary = "----TestBoundary";
    let body = multipart_file_body(boundary, "test.txt", "hello");

    let req = TestApp::request(Method::POST, "/api/media")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401, "upload without a session must be 401");
}

#[tokio::test]
async fn test_download_without_session_rejected() {
    let app = test_app();

    let id = uuid::Uuid::now_v7();
    let req = TestApp::request(Method::GET, &format!("/api/media/{id}/download"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "MISSING_AUTH");
}

#[tokio::test]
async fn test_upload_with_garbage_token_rejected() {
    let app = test_app();

    let boundary = "----TestBoundary";
    let body = multipart_file_body(boundary, "test.txt", "hello");

    let req = TestApp::request(Method::POST, "/api/media")
        .header("Authorization", "Bearer garbage")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 401);
}
