//! The per-identity permission map.

use crate::tags::{Action, Resource};

/// Fixed two-level lookup: resource → action → allowed.
///
/// Backed by a dense boolean table indexed by the enum tags, so every lookup
/// is a pair of array accesses and every entry that was never granted reads
/// as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionMap {
    allowed: [[bool; Action::COUNT]; Resource::COUNT],
}

impl PermissionMap {
    /// An empty map: everything denied.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            allowed: [[false; Action::COUNT]; Resource::COUNT],
        }
    }

    /// Whether `action` on `resource` is granted.
    #[must_use]
    pub const fn allows(&self, resource: Resource, action: Action) -> bool {
        self.allowed[resource.index()][action.index()]
    }

    /// Grant `action` on `resource`.
    pub fn grant(&mut self, resource: Resource, action: Action) {
        self.allowed[resource.index()][action.index()] = true;
    }

    /// Revoke `action` on `resource`.
    pub fn revoke(&mut self, resource: Resource, action: Action) {
        self.allowed[resource.index()][action.index()] = false;
    }

    /// Grant every action on `resource`.
    pub fn grant_all(&mut self, resource: Resource) {
        for action in Action::all() {
            self.grant(resource, *action);
        }
    }

    /// Build a map from `(resource, action, allowed)` rows, e.g. straight
    /// from the `role_permissions` table. Rows with `allowed = false` are
    /// applied last-wins like any other row.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Resource, Action, bool)>,
    {
        let mut map = Self::new();
        for (resource, action, allowed) in entries {
            if allowed {
                map.grant(resource, action);
            } else {
                map.revoke(resource, action);
            }
        }
        map
    }

    /// Iterate over all granted `(resource, action)` pairs, in tag order.
    pub fn granted(&self) -> impl Iterator<Item = (Resource, Action)> + '_ {
        Resource::all().iter().flat_map(move |resource| {
            Action::all()
                .iter()
                .filter(move |action| self.allows(*resource, **action))
                .map(move |action| (*resource, *action))
        })
    }

    /// Whether nothing is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_denies_everything() {
        let map = PermissionMap::new();
        for resource in Resource::all() {
            for action in Action::all() {
                assert!(!map.allows(*resource, *action));
            }
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut map = PermissionMap::new();
        map.grant(Resource::Media, Action::Create);

        assert!(map.allows(Resource::Media, Action::Create));
        assert!(!map.allows(Resource::Media, Action::Delete));
        assert!(!map.allows(Resource::Post, Action::Create));

        map.revoke(Resource::Media, Action::Create);
        assert!(!map.allows(Resource::Media, Action::Create));
    }

    #[test]
    fn test_grant_all() {
        let mut map = PermissionMap::new();
        map.grant_all(Resource::Tag);

        for action in Action::all() {
            assert!(map.allows(Resource::Tag, *action));
        }
        assert!(!map.allows(Resource::Category, Action::View));
    }

    #[test]
    fn test_from_entries_last_wins() {
        let map = PermissionMap::from_entries([
            (Resource::Post, Action::Update, true),
            (Resource::Post, Action::Delete, true),
            (Resource::Post, Action::Delete, false),
        ]);

        assert!(map.allows(Resource::Post, Action::Update));
        assert!(!map.allows(Resource::Post, Action::Delete));
    }

    #[test]
    fn test_granted_lists_exactly_the_grants() {
        let mut map = PermissionMap::new();
        map.grant(Resource::Media, Action::View);
        map.grant(Resource::Language, Action::Delete);

        let granted: Vec<_> = map.granted().collect();
        assert_eq!(
            granted,
            vec![
                (Resource::Media, Action::View),
                (Resource::Language, Action::Delete),
            ]
        );
    }
}
