//! Permission snapshot loading.

use sqlx::PgPool;

use pepper_rbac::{Action, PermissionMap, Resource, Role};

use crate::db::list_role_permissions;

/// Load the permission map for `role` from the `role_permissions` table.
///
/// Rows carrying resource or action names that no longer parse are skipped
/// with a warning: an unknown name can never become a grant (fails closed).
/// `SUPERADMIN` typically has no rows; its bypass lives in
/// [`pepper_rbac::can`], not in the map.
pub async fn load_role_permissions(pool: &PgPool, role: Role) -> sqlx::Result<PermissionMap> {
    let rows = list_role_permissions(pool, role.as_str()).await?;

    let entries = rows.iter().filter_map(|row| {
        let resource = Resource::from_str(&row.resource);
        let action = Action::from_str(&row.action);
        match (resource, action) {
            (Some(resource), Some(action)) => Some((resource, action, row.allowed)),
            _ => {
                tracing::warn!(
                    role = %row.role,
                    resource = %row.resource,
                    action = %row.action,
                    "Skipping permission row with unknown resource/action tag"
                );
                None
            }
        }
    });

    Ok(PermissionMap::from_entries(entries))
}
