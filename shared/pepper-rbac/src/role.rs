//! Role enumeration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role assigned to a user account.
///
/// Stored as its `as_str` name in the `users.role` column. `SUPERADMIN` is
/// special-cased by [`crate::can`]: it bypasses the permission map entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unconditional access to everything.
    Superadmin,
    /// Full administrative access within the granted permission map.
    Admin,
    /// Day-to-day content editing.
    Editor,
    /// Read-only access.
    Viewer,
}

/// Error for unknown role names coming from storage.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    /// Stable name stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "SUPERADMIN",
            Self::Admin => "ADMIN",
            Self::Editor => "EDITOR",
            Self::Viewer => "VIEWER",
        }
    }

    /// All roles.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Superadmin, Self::Admin, Self::Editor, Self::Viewer]
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    /// Parse a stored role name. Unknown names are an error, never a
    /// default: a request carrying an unrecognized role must fail rather
    /// than silently acquire any role's grants.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trip() {
        for role in Role::all() {
            assert_eq!(Role::from_str(role.as_str()), Ok(*role));
        }
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let err = Role::from_str("MODERATOR").unwrap_err();
        assert_eq!(err, RoleParseError("MODERATOR".to_string()));
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::Superadmin).unwrap(),
            "\"SUPERADMIN\""
        );
        let role: Role = serde_json::from_str("\"EDITOR\"").unwrap();
        assert_eq!(role, Role::Editor);
    }
}
