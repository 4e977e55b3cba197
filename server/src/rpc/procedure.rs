//! Procedure registry and guard stages.
//!
//! A procedure is a named handler plus an ordered list of guard stages.
//! Guards run before the handler, in registration order, and short-circuit
//! the call with an RPC error; stacking `authorized(...)` and
//! `require_role(...)` composes exactly like the HTTP middleware layers in
//! `crate::permissions`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use pepper_rbac::{can, Action, Identity, Resource, Role};

use crate::api::AppState;
use crate::auth::CurrentUser;

use super::error::RpcError;

/// Per-call context handed to guards and handlers.
#[derive(Clone)]
pub struct ProcedureContext {
    /// Shared application state.
    pub state: AppState,
    /// Resolved caller, if the request carried a valid token.
    pub user: Option<CurrentUser>,
}

impl ProcedureContext {
    /// The authenticated caller, or the unauthenticated error.
    ///
    /// Handlers behind an `authorized` guard can rely on this succeeding;
    /// the guard already rejected identity-less calls.
    pub fn actor(&self) -> Result<&CurrentUser, RpcError> {
        self.user.as_ref().ok_or(RpcError::Unauthorized)
    }

    fn identity(&self) -> Option<&Identity> {
        self.user.as_ref().map(|u| &u.identity)
    }
}

/// One guard stage evaluated ahead of a procedure handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Requires a resolved identity, then the permission check.
    Authorized {
        /// Required resource tag.
        resource: Resource,
        /// Required action tag.
        action: Action,
    },
    /// Requires a specific role (SUPERADMIN always passes).
    RequireRole(Role),
}

impl Guard {
    /// Evaluate this guard against the identity in context.
    pub fn check(&self, identity: Option<&Identity>) -> Result<(), RpcError> {
        match self {
            Self::Authorized { resource, action } => {
                let identity = identity.ok_or(RpcError::Unauthorized)?;
                if can(Some(identity), *resource, *action) {
                    Ok(())
                } else {
                    Err(RpcError::Forbidden)
                }
            }
            Self::RequireRole(role) => {
                let identity = identity.ok_or(RpcError::Unauthorized)?;
                if identity.role == *role || identity.role == Role::Superadmin {
                    Ok(())
                } else {
                    Err(RpcError::Forbidden)
                }
            }
        }
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, RpcError>> + Send>>;
type BoxedHandler = Box<dyn Fn(ProcedureContext, Value) -> HandlerFuture + Send + Sync>;

/// A registered procedure: name, guard chain, handler.
pub struct Procedure {
    name: &'static str,
    guards: Vec<Guard>,
    handler: BoxedHandler,
}

impl Procedure {
    /// Start building a procedure.
    #[must_use]
    pub fn builder(name: &'static str) -> ProcedureBuilder {
        ProcedureBuilder {
            name,
            guards: Vec::new(),
        }
    }

    /// Procedure name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The guard chain, in evaluation order.
    #[must_use]
    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// Run the guard chain, then the handler.
    pub async fn call(&self, ctx: ProcedureContext, input: Value) -> Result<Value, RpcError> {
        for guard in &self.guards {
            guard.check(ctx.identity())?;
        }
        (self.handler)(ctx, input).await
    }
}

impl std::fmt::Debug for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

/// Builder collecting guard stages before the handler is attached.
pub struct ProcedureBuilder {
    name: &'static str,
    guards: Vec<Guard>,
}

impl ProcedureBuilder {
    /// Require `action` on `resource` (implies an authenticated caller).
    #[must_use]
    pub fn authorized(mut self, resource: Resource, action: Action) -> Self {
        self.guards.push(Guard::Authorized { resource, action });
        self
    }

    /// Require a specific role on top of any other stages.
    #[must_use]
    pub fn require_role(mut self, role: Role) -> Self {
        self.guards.push(Guard::RequireRole(role));
        self
    }

    /// Attach the typed handler and finish the procedure.
    ///
    /// Input is deserialized from the envelope's `input` value; a mismatch
    /// is a `VALIDATION` error before the handler runs. The handler's output
    /// is serialized into the envelope's `result`.
    pub fn handler<In, Out, F, Fut>(self, f: F) -> Procedure
    where
        In: DeserializeOwned + Send + 'static,
        Out: Serialize,
        F: Fn(ProcedureContext, In) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, RpcError>> + Send + 'static,
    {
        let handler: BoxedHandler = Box::new(move |ctx, input| {
            let f = f.clone();
            Box::pin(async move {
                let input: In = serde_json::from_value(input)
                    .map_err(|e| RpcError::Validation(format!("Invalid input: {e}")))?;
                let output = f(ctx, input).await?;
                serde_json::to_value(output).map_err(|e| RpcError::Internal(e.to_string()))
            })
        });

        Procedure {
            name: self.name,
            guards: self.guards,
            handler,
        }
    }
}

/// Name-keyed procedure registry, built once at startup.
#[derive(Debug, Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<&'static str, Procedure>,
}

impl ProcedureRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure. Duplicate names are a programming error.
    pub fn register(&mut self, procedure: Procedure) {
        let name = procedure.name();
        assert!(
            self.procedures.insert(name, procedure).is_none(),
            "duplicate procedure name: {name}"
        );
    }

    /// Look up a procedure by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// All registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.procedures.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered procedures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_rejects_missing_identity_before_permission_lookup() {
        let guard = Guard::Authorized {
            resource: Resource::Media,
            action: Action::Create,
        };
        let err = guard.check(None).unwrap_err();
        assert!(matches!(err, RpcError::Unauthorized));
    }

    #[test]
    fn test_guard_permission_check() {
        let mut identity = Identity::new(Role::Editor, pepper_rbac::PermissionMap::new());
        identity.permissions.grant(Resource::Post, Action::Create);

        let allowed = Guard::Authorized {
            resource: Resource::Post,
            action: Action::Create,
        };
        let denied = Guard::Authorized {
            resource: Resource::Post,
            action: Action::Delete,
        };

        assert!(allowed.check(Some(&identity)).is_ok());
        assert!(matches!(
            denied.check(Some(&identity)).unwrap_err(),
            RpcError::Forbidden
        ));
    }

    #[test]
    fn test_role_guard() {
        let admin = Identity::new(Role::Admin, pepper_rbac::PermissionMap::new());
        let superadmin = Identity::new(Role::Superadmin, pepper_rbac::PermissionMap::new());
        let viewer = Identity::new(Role::Viewer, pepper_rbac::PermissionMap::new());

        let guard = Guard::RequireRole(Role::Admin);
        assert!(guard.check(Some(&admin)).is_ok());
        assert!(guard.check(Some(&superadmin)).is_ok());
        assert!(matches!(
            guard.check(Some(&viewer)).unwrap_err(),
            RpcError::Forbidden
        ));
    }

    #[test]
    fn test_builder_preserves_guard_order() {
        let procedure = Procedure::builder("test.op")
            .authorized(Resource::User, Action::Update)
            .require_role(Role::Admin)
            .handler(|_ctx: ProcedureContext, (): ()| async move { Ok(Value::Null) });

        assert_eq!(
            procedure.guards(),
            &[
                Guard::Authorized {
                    resource: Resource::User,
                    action: Action::Update,
                },
                Guard::RequireRole(Role::Admin),
            ]
        );
    }

    #[test]
    #[should_panic(expected = "duplicate procedure name")]
    fn test_duplicate_registration_panics() {
        let mut registry = ProcedureRegistry::new();
        registry.register(
            Procedure::builder("dup").handler(|_ctx: ProcedureContext, (): ()| async move {
                Ok(Value::Null)
            }),
        );
        registry.register(
            Procedure::builder("dup").handler(|_ctx: ProcedureContext, (): ()| async move {
                Ok(Value::Null)
            }),
        );
    }
}
