//! Authentication Middleware
//!
//! The session resolver: turns a bearer token into a [`CurrentUser`] with a
//! fresh role/permission snapshot, once per request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use pepper_rbac::{Identity, Role};

use crate::api::AppState;
use crate::db::find_user_by_id;
use crate::permissions::load_role_permissions;

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Authenticated user injected into request extensions.
///
/// Carries safe-to-expose profile data plus the authorization identity
/// (role + permission map) resolved for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email (if set).
    pub email: Option<String>,
    /// Authorization identity snapshot.
    pub identity: Identity,
}

/// Resolve the bearer token in `headers` into a [`CurrentUser`].
///
/// Returns `Ok(None)` when no Authorization header is present, and an error
/// for malformed headers, invalid tokens, or unknown users. Both the
/// `require_auth` middleware and the RPC dispatcher funnel through this, so
/// there is exactly one session resolver.
pub async fn resolve_bearer_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<CurrentUser>, AuthError> {
    let Some(auth_header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) else {
        return Ok(None);
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_access_token(token, &state.config.jwt_secret)?;

    let user_id: Uuid = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    let user = find_user_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let role: Role = user.role.parse()?;
    let permissions = load_role_permissions(&state.db, role).await?;

    Ok(Some(CurrentUser {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        email: user.email,
        identity: Identity::new(role, permissions),
    }))
}

/// Middleware to require authentication.
///
/// Validates the bearer token, resolves the caller's identity and injects
/// `CurrentUser` into request extensions. Requests without a token are
/// rejected before any handler logic runs.
///
/// # Usage
///
/// Apply to routes that require authentication:
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
#[tracing::instrument(skip_all)]
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = resolve_bearer_user(&state, request.headers())
        .await?
        .ok_or(AuthError::MissingAuthHeader)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user in handlers.
///
/// Only available behind [`require_auth`]; elsewhere it rejects with the
/// missing-header error.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}
