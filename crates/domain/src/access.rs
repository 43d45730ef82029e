//! Access control abstraction.
//!
//! Every service consumes the same [`AccessGuard`] trait instead of reaching
//! into a security framework, so "who is calling" resolution lives in one
//! place. The HTTP layer supplies a per-request implementation built from
//! the authenticated request; tests supply [`FixedGuard`]s.

use common::UserId;

use crate::error::CommerceError;

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub admin: bool,
}

impl Principal {
    /// Creates a regular user principal.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    /// Creates an admin principal.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }
}

/// Supplies the current authenticated principal and ownership checks.
pub trait AccessGuard: Send + Sync {
    /// Returns the authenticated principal, or None for anonymous callers.
    fn current_user(&self) -> Option<Principal>;

    /// Returns true if the caller is an authenticated admin.
    fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|p| p.admin)
    }

    /// Returns true if the caller is the owner of a resource.
    fn owns_resource(&self, owner: UserId) -> bool {
        self.current_user().is_some_and(|p| p.user_id == owner)
    }
}

/// Requires an authenticated principal.
pub fn require_user(guard: &dyn AccessGuard) -> Result<Principal, CommerceError> {
    guard.current_user().ok_or(CommerceError::Unauthorized)
}

/// Requires the caller to own the resource or be an admin.
pub fn require_owner_or_admin(
    guard: &dyn AccessGuard,
    owner: UserId,
) -> Result<Principal, CommerceError> {
    let principal = require_user(guard)?;
    if principal.admin || principal.user_id == owner {
        Ok(principal)
    } else {
        Err(CommerceError::Forbidden)
    }
}

/// Requires the caller to own the resource. Admin status does not help here;
/// this is the cancellation rule, where acting on another user's order is
/// deliberately not granted.
pub fn require_owner(guard: &dyn AccessGuard, owner: UserId) -> Result<Principal, CommerceError> {
    let principal = require_user(guard)?;
    if principal.user_id == owner {
        Ok(principal)
    } else {
        Err(CommerceError::Forbidden)
    }
}

/// Requires an authenticated admin.
pub fn require_admin(guard: &dyn AccessGuard) -> Result<Principal, CommerceError> {
    let principal = require_user(guard)?;
    if principal.admin {
        Ok(principal)
    } else {
        Err(CommerceError::Forbidden)
    }
}

/// Guard with a fixed principal, for tests and internal calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedGuard {
    principal: Option<Principal>,
}

impl FixedGuard {
    /// An anonymous caller.
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    /// A regular user.
    pub fn user(user_id: UserId) -> Self {
        Self {
            principal: Some(Principal::user(user_id)),
        }
    }

    /// An admin.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            principal: Some(Principal::admin(user_id)),
        }
    }
}

impl AccessGuard for FixedGuard {
    fn current_user(&self) -> Option<Principal> {
        self.principal
    }
}
