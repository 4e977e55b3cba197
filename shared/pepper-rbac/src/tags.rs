//! Resource and action enumerations.
//!
//! Closed sets of tags identifying a protected entity type and an operation
//! on it. The permission map is indexed by these, so lookups can never be
//! stringly-typed and unknown names can never sneak in as implicit grants.

use serde::{Deserialize, Serialize};

/// A protected entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Uploaded media assets and their variants.
    Media,
    /// Localized blog/news posts.
    Post,
    /// Localized products.
    Product,
    /// Content categories.
    Category,
    /// Content tags.
    Tag,
    /// Configured content languages.
    Language,
    /// User accounts and role assignment.
    User,
    /// The audit log.
    AuditLog,
}

/// An operation on a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read a single entity or list entities.
    View,
    /// Create a new entity.
    Create,
    /// Modify an existing entity.
    Update,
    /// Delete an entity.
    Delete,
}

impl Resource {
    /// Number of resource tags; sizes the permission map.
    pub const COUNT: usize = 8;

    /// Stable name used in the database and in audit entries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::Post => "post",
            Self::Product => "product",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::Language => "language",
            Self::User => "user",
            Self::AuditLog => "audit_log",
        }
    }

    /// Parse the stable name back into a tag. Unknown names yield `None`,
    /// which callers must treat as "no grant" (fails closed).
    #[must_use]
    pub fn from_str(name: &str) -> Option<Self> {
        Self::all().iter().find(|r| r.as_str() == name).copied()
    }

    /// Index into the permission map.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// All resource tags, in map order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Media,
            Self::Post,
            Self::Product,
            Self::Category,
            Self::Tag,
            Self::Language,
            Self::User,
            Self::AuditLog,
        ]
    }
}

impl Action {
    /// Number of action tags; sizes the permission map.
    pub const COUNT: usize = 4;

    /// Stable name used in the database and in audit entries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse the stable name back into a tag.
    #[must_use]
    pub fn from_str(name: &str) -> Option<Self> {
        Self::all().iter().find(|a| a.as_str() == name).copied()
    }

    /// Index into the permission map.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// All action tags, in map order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::View, Self::Create, Self::Update, Self::Delete]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_matches_all() {
        assert_eq!(Resource::all().len(), Resource::COUNT);
        assert_eq!(Action::all().len(), Action::COUNT);
    }

    #[test]
    fn test_indices_are_dense_and_unique() {
        let mut seen = vec![false; Resource::COUNT];
        for resource in Resource::all() {
            let idx = resource.index();
            assert!(idx < Resource::COUNT);
            assert!(!seen[idx], "duplicate index {idx}");
            seen[idx] = true;
        }
    }

    #[test]
    fn test_names_round_trip() {
        for resource in Resource::all() {
            assert_eq!(Resource::from_str(resource.as_str()), Some(*resource));
        }
        for action in Action::all() {
            assert_eq!(Action::from_str(action.as_str()), Some(*action));
        }
    }

    #[test]
    fn test_unknown_names_yield_none() {
        assert_eq!(Resource::from_str("page"), None);
        assert_eq!(Action::from_str("publish"), None);
    }

    #[test]
    fn test_names_are_snake_case() {
        for resource in Resource::all() {
            assert!(resource
                .as_str()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_serde_matches_as_str() {
        for resource in Resource::all() {
            let json = serde_json::to_string(resource).unwrap();
            assert_eq!(json, format!("\"{}\"", resource.as_str()));
        }
        for action in Action::all() {
            let json = serde_json::to_string(action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
