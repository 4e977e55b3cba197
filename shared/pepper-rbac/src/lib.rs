//! Pepper RBAC Core
//!
//! Pure permission model shared by the server and tooling: role and
//! resource/action enumerations, the per-identity permission map, and the
//! single canonical permission check [`can`].
//!
//! No I/O and no framework types live here. The server resolves an
//! [`Identity`] per request and every authorization decision funnels through
//! [`can`].

pub mod defaults;
pub mod map;
pub mod role;
pub mod tags;

pub use defaults::default_grants;
pub use map::PermissionMap;
pub use role::{Role, RoleParseError};
pub use tags::{Action, Resource};

/// The authenticated subject of a request, reduced to what authorization
/// needs: a role and a permission snapshot.
///
/// Immutable for the duration of one request; the server rebuilds it from
/// the database on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Role name of the subject.
    pub role: Role,
    /// Denormalized resource/action grants for the subject's role.
    pub permissions: PermissionMap,
}

impl Identity {
    /// Build an identity from a role and its permission snapshot.
    #[must_use]
    pub const fn new(role: Role, permissions: PermissionMap) -> Self {
        Self { role, permissions }
    }
}

/// Decide whether `identity` may perform `action` on `resource`.
///
/// - Absent identity (no session) is always denied.
/// - [`Role::Superadmin`] is allowed unconditionally, bypassing the map.
/// - Otherwise the permission map is consulted; entries that were never
///   granted are denied (fails closed).
///
/// No side effects; never panics.
#[must_use]
pub fn can(identity: Option<&Identity>, resource: Resource, action: Action) -> bool {
    match identity {
        None => false,
        Some(id) if id.role == Role::Superadmin => true,
        Some(id) => id.permissions.allows(resource, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity::new(role, PermissionMap::new())
    }

    #[test]
    fn test_absent_identity_is_denied() {
        for resource in Resource::all() {
            for action in Action::all() {
                assert!(!can(None, *resource, *action));
            }
        }
    }

    #[test]
    fn test_superadmin_is_allowed_everything() {
        // Empty map on purpose: the role bypasses the lookup entirely.
        let id = identity(Role::Superadmin);
        for resource in Resource::all() {
            for action in Action::all() {
                assert!(can(Some(&id), *resource, *action));
            }
        }
    }

    #[test]
    fn test_missing_entry_fails_closed() {
        let id = identity(Role::Editor);
        assert!(!can(Some(&id), Resource::Media, Action::Delete));
    }

    #[test]
    fn test_granted_entry_is_allowed() {
        let mut id = identity(Role::Editor);
        id.permissions.grant(Resource::Post, Action::Update);

        assert!(can(Some(&id), Resource::Post, Action::Update));
        // A different action on the same resource stays denied.
        assert!(!can(Some(&id), Resource::Post, Action::Delete));
    }

    #[test]
    fn test_revoked_entry_is_denied_again() {
        let mut id = identity(Role::Admin);
        id.permissions.grant(Resource::Tag, Action::Create);
        id.permissions.revoke(Resource::Tag, Action::Create);

        assert!(!can(Some(&id), Resource::Tag, Action::Create));
    }
}
