//! # poolkeep-ledger
//!
//! **Accounting core**: which assets the pool custodies, how much of each,
//! and the primitive that actually moves value in and out.
//!
//! ## Architecture
//!
//! 1. **AssetRegistry**: supported-asset set (native pinned) and operator limits
//! 2. **Ledger**: per-asset pool balances, the accounting source of truth
//! 3. **SupplyConservation**: cumulative credited / debited totals per asset
//! 4. **TransferGateway**: external value movement; may under-deliver
//! 5. **Journal**: append-only, hash-chained audit records
//!
//! ## Invariant
//!
//! ```text
//! ∀ asset: ledger.balance(asset) == Σ credited(asset) − Σ debited(asset) ≥ 0
//! ```
//!
//! Ledger mutations are pure; they are applied before any transfer and
//! rolled back by the caller if the transfer fails.

pub mod asset_registry;
pub mod gateway;
pub mod journal;
pub mod ledger;
pub mod supply_conservation;

pub use asset_registry::AssetRegistry;
pub use gateway::{InMemoryGateway, TransferGateway, pull_measured};
pub use journal::Journal;
pub use ledger::Ledger;
pub use supply_conservation::SupplyConservation;
