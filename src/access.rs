//! Owner-based access control
//!
//! Ownership is a composable capability check, not a base class: gated
//! operations call [`AccessGuard::require_owner`] at their start and can be
//! combined freely with the pause gate.

use crate::error::{Error, Result};
use crate::types::Principal;

/// Tracks the single privileged owner identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGuard {
    owner: Principal,
}

impl AccessGuard {
    /// Create a guard with the deploying caller as owner
    pub fn new(owner: Principal) -> Self {
        Self { owner }
    }

    /// Current owner
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Fail with `UnauthorizedAccess` unless the caller is the owner
    pub fn require_owner(&self, caller: &Principal) -> Result<()> {
        if caller != &self.owner {
            return Err(Error::UnauthorizedAccess {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Validate an ownership transfer without applying it
    ///
    /// The caller must be the current owner and the target must not be the
    /// null identity.
    pub fn validate_transfer(&self, caller: &Principal, new_owner: &Principal) -> Result<()> {
        self.require_owner(caller)?;
        if new_owner.is_null() {
            return Err(Error::InvalidInput(
                "transfer target is the null identity".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the owner (after a validated transfer was committed)
    pub(crate) fn set_owner(&mut self, owner: Principal) {
        self.owner = owner;
    }
}
