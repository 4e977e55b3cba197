//! RPC Boundary
//!
//! A single endpoint (`POST /api/rpc`) accepting a procedure name and input
//! payload. Procedures are registered once at startup with their guard
//! chains; the dispatcher resolves the caller's identity, looks the
//! procedure up by name, runs its guards and hands over to the handler.
//!
//! Success: `200 {"result": ...}`. Failure: `{"code", "message"}` with the
//! HTTP status implied by the code.

mod error;
mod procedure;
pub mod users;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::AppState;
use crate::auth::resolve_bearer_user;

pub use error::{RpcError, RpcErrorBody};
pub use procedure::{Guard, Procedure, ProcedureBuilder, ProcedureContext, ProcedureRegistry};

/// RPC request envelope.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RpcRequest {
    /// Registered procedure name, e.g. `"post.create"`.
    pub procedure: String,
    /// Procedure input; defaults to an empty object.
    #[serde(default)]
    pub input: Value,
}

/// RPC success envelope.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RpcResponse {
    /// Procedure output.
    pub result: Value,
}

/// Build the full procedure registry.
///
/// Every domain registers its procedures here; names are unique or startup
/// panics.
#[must_use]
pub fn build_registry() -> ProcedureRegistry {
    let mut registry = ProcedureRegistry::new();
    crate::content::register_procedures(&mut registry);
    crate::media::register_procedures(&mut registry);
    crate::audit::register_procedures(&mut registry);
    users::register_procedures(&mut registry);
    registry
}

/// Dispatch one RPC call.
///
/// POST /api/rpc
///
/// The identity is resolved here (optionally — guards decide whether one is
/// required) so that every failure, including unauthenticated calls, comes
/// back in the uniform `{code, message}` shape.
#[utoipa::path(
    post,
    path = "/api/rpc",
    tag = "rpc",
    request_body = RpcRequest,
    responses(
        (status = 200, body = RpcResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Unknown procedure or missing entity"),
    ),
    security((), ("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, headers, request), fields(procedure = %request.procedure))]
pub async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Result<Json<RpcResponse>, RpcError> {
    let user = resolve_bearer_user(&state, &headers).await?;

    let registry = Arc::clone(&state.rpc);
    let procedure = registry
        .get(&request.procedure)
        .ok_or_else(|| RpcError::UnknownProcedure(request.procedure.clone()))?;

    let ctx = ProcedureContext {
        state: state.clone(),
        user,
    };

    // Missing input means "no arguments"; procedures with optional fields
    // deserialize from the empty object.
    let input = if request.input.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        request.input
    };

    let result = procedure.call(ctx, input).await?;
    Ok(Json(RpcResponse { result }))
}

/// Validate an input type deriving `validator::Validate`, mapping violations
/// to the RPC validation error.
pub fn validate_input<T: validator::Validate>(input: &T) -> Result<(), RpcError> {
    input
        .validate()
        .map_err(|e| RpcError::Validation(e.to_string()))
}

/// Deserialize helper distinguishing an omitted field from an explicit null:
/// missing → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
