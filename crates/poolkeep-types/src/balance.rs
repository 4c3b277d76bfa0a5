//! Balance types for the pool ledger.
//!
//! Amounts are non-negative 256-bit integers in the asset's smallest unit,
//! the full range any asset balance can take.

use serde::{Deserialize, Serialize};

use crate::AssetId;

/// Quantity of an asset in base units.
pub type Amount = alloy_primitives::U256;

/// Pool balance of a single asset, as returned by balance enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetBalance {
    pub asset: AssetId,
    #[serde(with = "crate::amount_serde")]
    pub amount: Amount,
}

impl AssetBalance {
    #[must_use]
    pub fn new(asset: AssetId, amount: Amount) -> Self {
        Self { asset, amount }
    }
}
