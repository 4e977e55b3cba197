//! Authentication HTTP Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use pepper_rbac::{Action, Resource, Role};

use super::error::{AuthError, AuthResult};
use super::jwt::generate_access_token;
use super::middleware::CurrentUser;
use super::password::{hash_password, verify_password};
use crate::api::AppState;
use crate::db::{create_user, find_user_by_username, list_users};

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-z0-9_]{3,32}$").expect("static regex");
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// First-run setup request: creates the superadmin account.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SetupRequest {
    /// Username (3-32 lowercase alphanumeric + underscore).
    #[validate(regex(path = *USERNAME_REGEX))]
    pub username: String,
    /// Password (8-128 characters).
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Display name (optional, defaults to username).
    #[validate(length(max = 64))]
    pub display_name: Option<String>,
    /// Email address (optional).
    #[validate(email)]
    pub email: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Public user profile.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Role name.
    #[schema(value_type = String)]
    pub role: Role,
}

/// Successful authentication response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// Bearer access token.
    pub access_token: String,
    /// Token type, always "Bearer".
    pub token_type: &'static str,
    /// Access token validity in seconds.
    pub expires_in: i64,
    /// Authenticated user.
    pub user: UserProfile,
}

/// One granted resource/action pair.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PermissionEntry {
    /// Resource tag.
    #[schema(value_type = String)]
    pub resource: Resource,
    /// Action tag.
    #[schema(value_type = String)]
    pub action: Action,
}

/// Current-user response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email (if set).
    pub email: Option<String>,
    /// Role name.
    #[schema(value_type = String)]
    pub role: Role,
    /// Granted permissions. Empty for SUPERADMIN, whose bypass is implied
    /// by the role itself.
    pub permissions: Vec<PermissionEntry>,
}

// ============================================================================
// Handlers
// ============================================================================

/// First-run setup: create the superadmin account.
///
/// POST /auth/setup
///
/// Only succeeds while the users table is empty; afterwards it returns 409.
#[utoipa::path(
    post,
    path = "/auth/setup",
    tag = "auth",
    responses(
        (status = 201, body = AuthResponse),
        (status = 409, description = "Setup already completed"),
    ),
)]
#[tracing::instrument(skip(state, body), fields(username = %body.username))]
pub async fn setup(
    State(state): State<AppState>,
    Json(body): Json<SetupRequest>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)> {
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    // Any existing user means setup has already happened.
    if !list_users(&state.db, 1, 0).await?.is_empty() {
        return Err(AuthError::SetupAlreadyDone);
    }

    let password_hash = hash_password(&body.password).map_err(|_| AuthError::PasswordHash)?;
    let display_name = body.display_name.as_deref().unwrap_or(&body.username);

    let user = create_user(
        &state.db,
        &body.username,
        display_name,
        body.email.as_deref(),
        &password_hash,
        Role::Superadmin.as_str(),
    )
    .await?;

    crate::audit::record(
        &state.db,
        user.id,
        "auth.setup",
        Some("user"),
        Some(user.id),
        None,
    )
    .await;

    let access_token =
        generate_access_token(user.id, &state.config.jwt_secret, state.config.jwt_access_expiry)?;

    tracing::info!(user_id = %user.id, "Initial superadmin account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            token_type: "Bearer",
            expires_in: state.config.jwt_access_expiry,
            user: UserProfile {
                id: user.id,
                username: user.username,
                display_name: user.display_name,
                role: Role::Superadmin,
            },
        }),
    ))
}

/// Login with username and password.
///
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    responses(
        (status = 200, body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    ),
)]
#[tracing::instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AuthResult<Json<AuthResponse>> {
    // Same error for unknown user and wrong password; do not leak which.
    let user = find_user_by_username(&state.db, &body.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    verify_password(&body.password, &user.password_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    let role: Role = user.role.parse()?;
    let access_token =
        generate_access_token(user.id, &state.config.jwt_secret, state.config.jwt_access_expiry)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt_access_expiry,
        user: UserProfile {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role,
        },
    }))
}

/// Current user profile with role and granted permissions.
///
/// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses((status = 200, body = MeResponse)),
    security(("bearer_auth" = [])),
)]
pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    let permissions = user
        .identity
        .permissions
        .granted()
        .map(|(resource, action)| PermissionEntry { resource, action })
        .collect();

    Json(MeResponse {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        email: user.email,
        role: user.identity.role,
        permissions,
    })
}
