//! Permission system wiring.
//!
//! The pure model (roles, resources, actions, the `can` check) lives in the
//! `pepper-rbac` crate; this module loads per-role snapshots from the
//! database and exposes the stackable HTTP guards.

mod middleware;
mod queries;

pub use middleware::{require_permission, require_role, PermissionError};
pub use queries::load_role_permissions;
