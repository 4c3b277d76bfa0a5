//! Reentrancy guard and exclusion domain for pool state.
//!
//! The guard owns the state it protects. [`ReentrancyGuard::enter`]
//! serializes callers from different threads behind one lock, and fails
//! fast with [`PoolError::Reentrant`] when the thread already inside calls
//! back in (for example from a transfer hook). Without that check the
//! nested call would deadlock on the state lock.
//!
//! The in-progress marker is set once the state lock is held and cleared
//! when the [`Entered`] token drops, on every exit path including early
//! `?` returns and unwinding.

use std::{
    ops::{Deref, DerefMut},
    sync::{Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
};

use poolkeep_types::{PoolError, Result};

/// Exclusive, reentrancy-checked access to `T`.
#[derive(Debug)]
pub struct ReentrancyGuard<T> {
    /// Thread currently inside, if any.
    owner: Mutex<Option<ThreadId>>,
    state: Mutex<T>,
}

impl<T> ReentrancyGuard<T> {
    #[must_use]
    pub fn new(state: T) -> Self {
        Self {
            owner: Mutex::new(None),
            state: Mutex::new(state),
        }
    }

    /// Enter the exclusive section.
    ///
    /// # Errors
    /// - `Reentrant` if the calling thread is already inside
    /// - `Internal` if a previous holder panicked mid-operation
    pub fn enter(&self) -> Result<Entered<'_, T>> {
        let me = thread::current().id();
        if *self.owner_slot() == Some(me) {
            tracing::warn!(thread = ?me, "Reentrant call rejected");
            return Err(PoolError::Reentrant);
        }

        let state = self
            .state
            .lock()
            .map_err(|_| PoolError::Internal("pool state poisoned by a panicked operation".into()))?;
        *self.owner_slot() = Some(me);
        Ok(Entered { guard: self, state })
    }

    /// Whether any thread is currently inside.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.owner_slot().is_some()
    }

    fn owner_slot(&self) -> MutexGuard<'_, Option<ThreadId>> {
        // Only ever held for a single read or write; never poisoned in practice.
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of being inside the exclusive section. Derefs to the state.
pub struct Entered<'a, T> {
    guard: &'a ReentrancyGuard<T>,
    state: MutexGuard<'a, T>,
}

impl<T> Deref for Entered<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.state
    }
}

impl<T> DerefMut for Entered<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.state
    }
}

impl<T> Drop for Entered<'_, T> {
    fn drop(&mut self) {
        // Runs before `state` is released, so no other thread can observe
        // the lock free while the marker is still set.
        *self.guard.owner_slot() = None;
    }
}
