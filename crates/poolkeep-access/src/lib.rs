//! # poolkeep-access
//!
//! **Access Plane**: who may do what, and when anything may be done at all.
//!
//! ## Architecture
//!
//! 1. **RoleRegistry**: role membership per identity (DefaultAdmin, Admin, Operator)
//! 2. **WithdrawalPolicy**: pure allow/deny decision for single withdrawals
//! 3. **PauseSwitch**: circuit breaker over every value-moving entry point
//! 4. **ReentrancyGuard**: single exclusion domain around pool state that
//!    rejects nested calls from the thread already inside
//!
//! ## Entry Point Order
//!
//! ```text
//! ReentrancyGuard.enter() → PauseSwitch.check() → RoleRegistry / WithdrawalPolicy
//!     → ledger mutation → transfer → audit record
//! ```

pub mod pause_switch;
pub mod reentrancy;
pub mod role_registry;
pub mod withdrawal_policy;

pub use pause_switch::PauseSwitch;
pub use reentrancy::{Entered, ReentrancyGuard};
pub use role_registry::RoleRegistry;
pub use withdrawal_policy::{DenyReason, WithdrawalDecision, WithdrawalPolicy};
