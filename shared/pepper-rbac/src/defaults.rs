//! Built-in permission grants per role.
//!
//! These mirror the seed rows in the server's migrations and back the tests
//! that pin the shipped defaults. `SUPERADMIN` deliberately has no grants
//! here: its bypass lives in [`crate::can`], not in the map.

use crate::map::PermissionMap;
use crate::role::Role;
use crate::tags::{Action, Resource};

/// Content-shaped resources editors and viewers work with.
const CONTENT_RESOURCES: &[Resource] = &[
    Resource::Media,
    Resource::Post,
    Resource::Product,
    Resource::Category,
    Resource::Tag,
    Resource::Language,
];

/// The default permission map shipped for `role`.
#[must_use]
pub fn default_grants(role: Role) -> PermissionMap {
    let mut map = PermissionMap::new();
    match role {
        // Bypass handled in can(); an empty map keeps the invariant visible.
        Role::Superadmin => {}
        Role::Admin => {
            for resource in CONTENT_RESOURCES {
                map.grant_all(*resource);
            }
            map.grant(Resource::User, Action::View);
            map.grant(Resource::User, Action::Create);
            map.grant(Resource::User, Action::Update);
            map.grant(Resource::AuditLog, Action::View);
        }
        Role::Editor => {
            for resource in CONTENT_RESOURCES {
                map.grant_all(*resource);
            }
        }
        Role::Viewer => {
            for resource in CONTENT_RESOURCES {
                map.grant(*resource, Action::View);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{can, Identity};

    #[test]
    fn test_admin_cannot_delete_users_or_touch_audit_log() {
        let id = Identity::new(Role::Admin, default_grants(Role::Admin));

        assert!(can(Some(&id), Resource::User, Action::Update));
        assert!(!can(Some(&id), Resource::User, Action::Delete));
        assert!(can(Some(&id), Resource::AuditLog, Action::View));
        assert!(!can(Some(&id), Resource::AuditLog, Action::Delete));
    }

    #[test]
    fn test_editor_has_full_content_but_no_user_access() {
        let id = Identity::new(Role::Editor, default_grants(Role::Editor));

        for resource in CONTENT_RESOURCES {
            for action in Action::all() {
                assert!(can(Some(&id), *resource, *action));
            }
        }
        assert!(!can(Some(&id), Resource::User, Action::View));
        assert!(!can(Some(&id), Resource::AuditLog, Action::View));
    }

    #[test]
    fn test_viewer_is_read_only() {
        let id = Identity::new(Role::Viewer, default_grants(Role::Viewer));

        assert!(can(Some(&id), Resource::Post, Action::View));
        assert!(!can(Some(&id), Resource::Post, Action::Create));
        assert!(!can(Some(&id), Resource::Media, Action::Delete));
    }

    #[test]
    fn test_superadmin_map_is_empty_but_check_allows() {
        let map = default_grants(Role::Superadmin);
        assert!(map.is_empty());

        let id = Identity::new(Role::Superadmin, map);
        assert!(can(Some(&id), Resource::AuditLog, Action::Delete));
    }
}
