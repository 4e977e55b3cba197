//! API Router and Application State
//!
//! Central routing configuration and shared state.

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth,
    config::Config,
    media,
    media::ObjectStorage,
    rpc,
    rpc::ProcedureRegistry,
};

/// Shared application state.
///
/// Constructed once at startup and cloned per request; there is no
/// process-wide singleton behind it.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Object storage for media variants (optional)
    pub storage: Option<ObjectStorage>,
    /// RPC procedure registry
    pub rpc: Arc<ProcedureRegistry>,
}

impl AppState {
    /// Create new application state. The RPC registry is built here, once.
    #[must_use]
    pub fn new(db: PgPool, config: Config, storage: Option<ObjectStorage>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            storage,
            rpc: Arc::new(rpc::build_registry()),
        }
    }

    /// Check if object storage is configured and available.
    #[must_use]
    pub const fn has_storage(&self) -> bool {
        self.storage.is_some()
    }
}

/// OpenAPI documentation for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::handlers::setup,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::rpc::dispatch,
        crate::media::handlers::upload,
        crate::media::handlers::download,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "rpc", description = "Procedure dispatch"),
        (name = "media", description = "Media upload and download"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Leave headroom above the configured file size for multipart framing
    // and metadata fields.
    let body_limit = state.config.max_upload_size + 1024 * 1024;

    // Media routes: auth layer here, per-route permission layers inside.
    let protected_routes = Router::new()
        .nest("/api/media", media::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes (pass state for middleware)
        .nest("/auth", auth::router(state.clone()))
        // RPC boundary; resolves its own identity so every error is {code, message}
        .route("/api/rpc", post(rpc::dispatch))
        // Media upload/download
        .merge(protected_routes)
        // API documentation
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
