//! API-side authorization guard for admin commands.
//!
//! Enforced at the command boundary (before dispatch), keeping domain
//! aggregates and infra auth-agnostic.

use couture_auth::{AuthzError, CommandAuthorization, Permission, Principal, authorize};

use crate::context::PrincipalContext;

/// Check authorization for a command in the current request context.
///
/// Intended to be called **before** dispatching a command.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = Principal {
        principal_id: principal.principal_id(),
        permissions: permissions_from_roles(principal.roles()),
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Minimal role→permission mapping.
///
/// Convention: "admin" grants every back-office permission. A finer policy
/// source can replace this without touching handlers.
fn permissions_from_roles(roles: &[couture_auth::Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r.as_str() == "admin") {
        return vec![Permission::new("*")];
    }

    Vec::new()
}
