//! # poolkeep-settlement
//!
//! **Settlement Plane**: the pool's externally callable surface.
//!
//! ## Architecture
//!
//! 1. **CustodyPool**: deposits, withdrawals, batches, administration,
//!    role management, and queries over one exclusion domain
//! 2. **BatchSettlementEngine**: bounded, all-or-nothing batch payin and
//!    two-phase batch payout
//!
//! ## Atomicity
//!
//! A failing call restores the ledger checkpoint, rolls back the gateway
//! frame, and appends nothing to the journal.

pub mod batch;
pub mod pool;

pub use batch::{BatchContext, BatchSettlementEngine};
pub use pool::CustodyPool;
