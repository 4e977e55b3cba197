//! User administration procedures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pepper_rbac::{Action, Resource, Role};

use crate::db;

use super::{Procedure, ProcedureContext, ProcedureRegistry, RpcError};

/// Input for `user.list`.
#[derive(Debug, Deserialize)]
pub struct ListUsersInput {
    /// Page size (default 50, capped at 200).
    #[serde(default)]
    pub limit: Option<i64>,
    /// Page offset.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input for `user.set_role`.
#[derive(Debug, Deserialize)]
pub struct SetRoleInput {
    /// Target user.
    pub user_id: Uuid,
    /// New role.
    pub role: Role,
}

/// User summary returned by administration procedures.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<db::User> for UserSummary {
    fn from(user: db::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Register user administration procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("user.list")
            .authorized(Resource::User, Action::View)
            .handler(list_users),
    );

    // Role assignment is permission-gated AND role-gated: even a custom
    // grant of user/update does not allow it below ADMIN.
    registry.register(
        Procedure::builder("user.set_role")
            .authorized(Resource::User, Action::Update)
            .require_role(Role::Admin)
            .handler(set_role),
    );
}

async fn list_users(
    ctx: ProcedureContext,
    input: ListUsersInput,
) -> Result<Vec<UserSummary>, RpcError> {
    let limit = input.limit.unwrap_or(50).clamp(1, 200);
    let offset = input.offset.unwrap_or(0).max(0);

    let users = db::list_users(&ctx.state.db, limit, offset).await?;
    Ok(users.into_iter().map(UserSummary::from).collect())
}

async fn set_role(ctx: ProcedureContext, input: SetRoleInput) -> Result<UserSummary, RpcError> {
    let actor = ctx.actor()?;

    // Nobody assigns SUPERADMIN through the API; that is a deployment step.
    if input.role == Role::Superadmin {
        return Err(RpcError::Validation(
            "The SUPERADMIN role cannot be assigned".to_string(),
        ));
    }

    if actor.id == input.user_id {
        return Err(RpcError::Validation(
            "Changing your own role is not allowed".to_string(),
        ));
    }

    let updated = db::update_user_role(&ctx.state.db, input.user_id, input.role.as_str())
        .await?
        .ok_or(RpcError::NotFound("User"))?;

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "user.set_role",
        Some("user"),
        Some(updated.id),
        Some(&serde_json::json!({ "role": input.role.as_str() })),
    )
    .await;

    Ok(UserSummary::from(updated))
}
