//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full
//! axum router. The test app uses a lazily-connecting pool, so request
//! paths that reject before touching the database (missing/invalid tokens,
//! unknown procedures, malformed envelopes) run without any live Postgres.

// Each test binary compiles its own copy; not every binary uses every helper.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::util::ServiceExt;

use pepper_server::api::{create_router, AppState};
use pepper_server::config::Config;

/// A router plus the config it was built from.
pub struct TestApp {
    router: axum::Router,
    pub config: Config,
}

/// Build a test app with no object storage and a lazy database pool.
pub fn test_app() -> TestApp {
    let config = Config::default_for_test();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool from static URL");
    let state = AppState::new(pool, config.clone(), None);

    TestApp {
        router: create_router(state),
        config,
    }
}

impl TestApp {
    /// Start a request builder.
    pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Drive one request through the router.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// A minimal multipart body with a single `file` field.
pub fn multipart_file_body(boundary: &str, filename: &str, content: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{boundary}--\r\n"
    )
}
