//! Operational pause switch
//!
//! A boolean gate on write operations, composable with the owner guard.
//! Redundant toggles fail rather than silently no-op, so caller mistakes
//! surface.

use crate::error::{Error, Result};

/// Write-gating pause flag, default active (not paused)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseSwitch {
    paused: bool,
}

impl PauseSwitch {
    /// Create a switch with an explicit state (used when restoring)
    pub fn with_state(paused: bool) -> Self {
        Self { paused }
    }

    /// Current paused state
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with `ContractPaused` unless writes are currently legal
    pub fn require_active(&self) -> Result<()> {
        if self.paused {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    /// Validate the Active → Paused transition without applying it
    pub fn validate_engage(&self) -> Result<()> {
        if self.paused {
            return Err(Error::AlreadyPaused);
        }
        Ok(())
    }

    /// Validate the Paused → Active transition without applying it
    pub fn validate_release(&self) -> Result<()> {
        if !self.paused {
            return Err(Error::AlreadyActive);
        }
        Ok(())
    }

    /// Apply a validated transition
    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_active() {
        let switch = PauseSwitch::default();
        assert!(!switch.is_paused());
        assert!(switch.require_active().is_ok());
        assert!(switch.validate_engage().is_ok());
    }

    #[test]
    fn test_pause_cycle() {
        let mut switch = PauseSwitch::default();
        switch.validate_engage().unwrap();
        switch.set_paused(true);
        assert!(switch.is_paused());
        assert!(matches!(switch.require_active(), Err(Error::ContractPaused)));
        switch.validate_release().unwrap();
        switch.set_paused(false);
        assert!(switch.require_active().is_ok());
    }

    #[test]
    fn test_redundant_toggles_fail() {
        let mut switch = PauseSwitch::default();
        assert!(matches!(switch.validate_release(), Err(Error::AlreadyActive)));
        switch.set_paused(true);
        assert!(matches!(switch.validate_engage(), Err(Error::AlreadyPaused)));
    }

    #[test]
    fn test_with_state() {
        assert!(PauseSwitch::with_state(true).is_paused());
        assert!(!PauseSwitch::with_state(false).is_paused());
    }
}
