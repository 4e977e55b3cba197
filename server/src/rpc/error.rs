//! RPC Error Types
//!
//! Every RPC failure serializes as `{"code": ..., "message": ...}` with the
//! HTTP status implied by the code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// RPC error taxonomy.
#[derive(Debug, Error)]
pub enum RpcError {
    /// No identity resolved for the request.
    #[error("Authentication required")]
    Unauthorized,

    /// Identity resolved but the permission check failed.
    #[error("Insufficient permissions")]
    Forbidden,

    /// No procedure registered under the requested name.
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// Input failed deserialization or schema validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Target entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Conflicting state (duplicate slug, in-use entity, ...).
    #[error("{0}")]
    Conflict(String),

    /// Database error. Detail is logged, never serialized.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// Anything else. Detail is logged, never serialized.
    #[error("Internal server error")]
    Internal(String),
}

/// RPC error response body.
#[derive(Debug, Serialize)]
pub struct RpcErrorBody {
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl RpcError {
    /// The stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::UnknownProcedure(_) | Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) | Self::Internal(_) => "INTERNAL",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UnknownProcedure(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        if let Self::Database(ref e) = self {
            tracing::error!(error = %e, "RPC database error");
        }
        if let Self::Internal(ref detail) = self {
            tracing::error!(detail = %detail, "RPC internal error");
        }

        let body = Json(RpcErrorBody {
            code: self.code(),
            message: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}

/// Session-resolution failures surface as RPC codes: database trouble is
/// internal, everything else means the token did not resolve to an identity.
impl From<AuthError> for RpcError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Database(e) => Self::Database(e),
            AuthError::Role(e) => Self::Internal(e.to_string()),
            AuthError::Internal(detail) => Self::Internal(detail),
            _ => Self::Unauthorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(RpcError::Unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(RpcError::Forbidden.code(), "FORBIDDEN");
        assert_eq!(RpcError::UnknownProcedure("x".into()).code(), "NOT_FOUND");
        assert_eq!(RpcError::Validation("bad".into()).code(), "VALIDATION");
        assert_eq!(RpcError::NotFound("Post").code(), "NOT_FOUND");
        assert_eq!(RpcError::Conflict("dup".into()).code(), "CONFLICT");
        assert_eq!(RpcError::Internal("boom".into()).code(), "INTERNAL");
    }

    #[test]
    fn test_internal_detail_not_in_message() {
        let err = RpcError::Internal("connection string leaked".into());
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_auth_error_maps_to_unauthorized() {
        let err: RpcError = AuthError::MissingAuthHeader.into();
        assert!(matches!(err, RpcError::Unauthorized));

        let err: RpcError = AuthError::InvalidToken.into();
        assert!(matches!(err, RpcError::Unauthorized));
    }
}
