//! Audit Logging
//!
//! Append-only record of mutating operations: who did what to which entity.
//! Recording never fails the operation it documents; insert errors are
//! logged and swallowed.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use pepper_rbac::{Action, Resource};

use crate::db::{self, AuditLogEntry};
use crate::rpc::{Procedure, ProcedureContext, ProcedureRegistry, RpcError};

/// Record an audit entry for a completed mutation.
///
/// `action` is the procedure-style name (`"media.upload"`, `"post.delete"`),
/// `target_type`/`target_id` identify the entity, `details` carries
/// operation-specific context.
pub async fn record(
    pool: &PgPool,
    actor_id: Uuid,
    action: &str,
    target_type: Option<&str>,
    target_id: Option<Uuid>,
    details: Option<&serde_json::Value>,
) {
    if let Err(e) =
        db::insert_audit_entry(pool, actor_id, action, target_type, target_id, details).await
    {
        tracing::error!(
            actor_id = %actor_id,
            action = %action,
            error = %e,
            "Failed to record audit entry"
        );
    }
}

/// Input for `audit.list`.
#[derive(Debug, Deserialize)]
pub struct ListAuditInput {
    /// Page size (default 50, capped at 200).
    #[serde(default)]
    pub limit: Option<i64>,
    /// Page offset.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Register audit procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("audit.list")
            .authorized(Resource::AuditLog, Action::View)
            .handler(list_entries),
    );
}

async fn list_entries(
    ctx: ProcedureContext,
    input: ListAuditInput,
) -> Result<Vec<AuditLogEntry>, RpcError> {
    let limit = input.limit.unwrap_or(50).clamp(1, 200);
    let offset = input.offset.unwrap_or(0).max(0);

    Ok(db::list_audit_entries(&ctx.state.db, limit, offset).await?)
}
