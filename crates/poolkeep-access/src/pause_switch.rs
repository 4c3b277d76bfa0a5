//! Pool-wide circuit breaker.
//!
//! While paused, every deposit, withdrawal, and batch entry point fails
//! with [`PoolError::Paused`]. Queries, asset management, and role
//! management are unaffected.

use poolkeep_types::{Address, PoolError, Result, Role};

use crate::RoleRegistry;

/// Admin-controlled pause flag.
#[derive(Debug, Clone, Default)]
pub struct PauseSwitch {
    paused: bool,
}

impl PauseSwitch {
    /// Create a running (unpaused) switch.
    #[must_use]
    pub fn new() -> Self {
        Self { paused: false }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Guard a value-moving operation. Returns `Ok(())` if running,
    /// or [`PoolError::Paused`] if halted.
    pub fn check(&self) -> Result<()> {
        if self.paused {
            Err(PoolError::Paused)
        } else {
            Ok(())
        }
    }

    /// Halt value-moving operations. Admin-only.
    pub fn pause(&mut self, roles: &RoleRegistry, caller: Address) -> Result<()> {
        roles.require(caller, Role::Admin)?;
        if self.paused {
            return Err(PoolError::AlreadyPaused);
        }
        self.paused = true;
        Ok(())
    }

    /// Resume value-moving operations. Admin-only.
    pub fn unpause(&mut self, roles: &RoleRegistry, caller: Address) -> Result<()> {
        roles.require(caller, Role::Admin)?;
        if !self.paused {
            return Err(PoolError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }
}
