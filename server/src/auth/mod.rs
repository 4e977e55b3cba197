//! Authentication Service
//!
//! Local username/password authentication, bearer-token sessions, and the
//! per-request session resolver that attaches the caller's identity and
//! permission snapshot to the request.

mod error;
pub mod handlers;
pub mod jwt;
mod middleware;
mod password;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use error::{AuthError, AuthResult};
pub use middleware::{require_auth, resolve_bearer_user, CurrentUser};
pub use password::{hash_password, verify_password};

/// Create authentication router.
///
/// Public routes (no auth required):
/// - POST /setup - Create the first (superadmin) account
/// - POST /login - Login with username/password
///
/// Protected routes (auth required):
/// - GET /me - Current profile, role and granted permissions
pub fn router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/setup", post(handlers::setup))
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}
