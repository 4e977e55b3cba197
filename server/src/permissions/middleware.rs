//! Stackable authorization middleware for plain HTTP routes.
//!
//! Both factories return closures usable with `axum::middleware::from_fn`,
//! so route trees can layer any number of checks ahead of a handler:
//!
//! ```ignore
//! Router::new()
//!     .route("/api/media", post(upload))
//!     .layer(from_fn(require_permission(Resource::Media, Action::Create)))
//!     .layer(from_fn_with_state(state, require_auth))
//! ```
//!
//! Layers run outermost-first, so `require_auth` resolves the identity
//! before any permission check inspects it.

use std::future::Future;
use std::pin::Pin;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use pepper_rbac::{can, Action, Resource, Role};

use crate::auth::CurrentUser;

/// Authorization failures for guarded routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// No identity was resolved for the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity resolved but the permission check failed.
    #[error("Insufficient permissions")]
    Forbidden,
}

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Evaluate the permission check against the identity in request context.
fn check_permission(
    user: Option<&CurrentUser>,
    resource: Resource,
    action: Action,
) -> Result<(), PermissionError> {
    let user = user.ok_or(PermissionError::Unauthenticated)?;
    if can(Some(&user.identity), resource, action) {
        Ok(())
    } else {
        Err(PermissionError::Forbidden)
    }
}

/// Evaluate a role requirement against the identity in request context.
/// SUPERADMIN satisfies every role requirement.
fn check_role(user: Option<&CurrentUser>, role: Role) -> Result<(), PermissionError> {
    let user = user.ok_or(PermissionError::Unauthenticated)?;
    if user.identity.role == role || user.identity.role == Role::Superadmin {
        Ok(())
    } else {
        Err(PermissionError::Forbidden)
    }
}

/// Middleware factory requiring `action` on `resource`.
///
/// Rejects with 401 when no identity is in context and 403 when the
/// permission check fails; the handler is never reached in either case.
pub fn require_permission(
    resource: Resource,
    action: Action,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + 'static
{
    move |request: Request, next: Next| {
        Box::pin(async move {
            let user = request.extensions().get::<CurrentUser>();
            match check_permission(user, resource, action) {
                Ok(()) => next.run(request).await,
                Err(e) => e.into_response(),
            }
        })
    }
}

/// Middleware factory requiring a specific role.
///
/// Stacks with [`require_permission`]; checks run in layer order.
pub fn require_role(
    role: Role,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + 'static
{
    move |request: Request, next: Next| {
        Box::pin(async move {
            let user = request.extensions().get::<CurrentUser>();
            match check_role(user, role) {
                Ok(()) => next.run(request).await,
                Err(e) => e.into_response(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepper_rbac::{default_grants, Identity};
    use uuid::Uuid;

    fn user_with_role(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::now_v7(),
            username: "tester".to_string(),
            display_name: "Tester".to_string(),
            email: None,
            identity: Identity::new(role, default_grants(role)),
        }
    }

    #[test]
    fn test_missing_identity_is_unauthenticated() {
        let err = check_permission(None, Resource::Media, Action::Create).unwrap_err();
        assert_eq!(err, PermissionError::Unauthenticated);

        let err = check_role(None, Role::Admin).unwrap_err();
        assert_eq!(err, PermissionError::Unauthenticated);
    }

    #[test]
    fn test_editor_can_create_media_but_not_view_users() {
        let user = user_with_role(Role::Editor);

        assert!(check_permission(Some(&user), Resource::Media, Action::Create).is_ok());
        assert_eq!(
            check_permission(Some(&user), Resource::User, Action::View),
            Err(PermissionError::Forbidden)
        );
    }

    #[test]
    fn test_role_requirement() {
        let editor = user_with_role(Role::Editor);
        let admin = user_with_role(Role::Admin);
        let superadmin = user_with_role(Role::Superadmin);

        assert_eq!(
            check_role(Some(&editor), Role::Admin),
            Err(PermissionError::Forbidden)
        );
        assert!(check_role(Some(&admin), Role::Admin).is_ok());
        // SUPERADMIN passes any role requirement.
        assert!(check_role(Some(&superadmin), Role::Admin).is_ok());
    }

    #[test]
    fn test_superadmin_passes_every_permission() {
        let user = user_with_role(Role::Superadmin);
        for resource in Resource::all() {
            for action in Action::all() {
                assert!(check_permission(Some(&user), *resource, *action).is_ok());
            }
        }
    }
}
