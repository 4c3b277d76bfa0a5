//! Per-asset pool balances.
//!
//! `credit` and `debit` are pure state mutations with no external side
//! effects. Both either apply fully or leave the ledger unchanged, and
//! both keep [`SupplyConservation`] in step with the balance map.

use std::collections::HashMap;

use poolkeep_types::{Amount, AssetBalance, AssetId, PoolError, Result};

use crate::{AssetRegistry, SupplyConservation};

/// The accounting source of truth for what the pool custodies.
///
/// `Clone` is used for checkpoints: an entry point clones the ledger before
/// mutating and restores the clone if a later step fails.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<AssetId, Amount>,
    supply: SupplyConservation,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool balance of `asset`; zero if never credited.
    #[must_use]
    pub fn balance(&self, asset: AssetId) -> Amount {
        self.balances.get(&asset).copied().unwrap_or_default()
    }

    /// Increase the pool balance of a supported asset. Returns the new balance.
    ///
    /// # Errors
    /// - `NotSupported` if the asset is not in the registry
    /// - `SupplyInvariantViolation` if the balance would pass `Amount::MAX`,
    ///   more than any asset can have in existence
    pub fn credit(&mut self, assets: &AssetRegistry, asset: AssetId, amount: Amount) -> Result<Amount> {
        assets.require_supported(asset)?;
        let current = self.balance(asset);
        let next = current
            .checked_add(amount)
            .ok_or_else(|| PoolError::SupplyInvariantViolation {
                reason: format!("asset {asset}: crediting {amount} to {current} exceeds the amount range"),
            })?;
        self.supply.record_credit(asset, amount);
        self.balances.insert(asset, next);
        Ok(next)
    }

    /// Decrease the pool balance of a supported asset. Returns the new balance.
    ///
    /// # Errors
    /// - `NotSupported` if the asset is not in the registry
    /// - `InsufficientBalance` if the pool holds less than `amount`
    pub fn debit(&mut self, assets: &AssetRegistry, asset: AssetId, amount: Amount) -> Result<Amount> {
        assets.require_supported(asset)?;
        let current = self.balance(asset);
        let next = current
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientBalance {
                asset,
                needed: amount,
                available: current,
            })?;
        self.supply.record_debit(asset, amount);
        self.balances.insert(asset, next);
        Ok(next)
    }

    /// Balances of the given assets, in the given order.
    #[must_use]
    pub fn balances_of(&self, assets: &[AssetId]) -> Vec<AssetBalance> {
        assets
            .iter()
            .map(|asset| AssetBalance::new(*asset, self.balance(*asset)))
            .collect()
    }

    /// Check the conservation invariant for one asset.
    pub fn verify_supply(&self, asset: AssetId) -> Result<()> {
        self.supply.verify(asset, self.balance(asset))
    }

    /// Check the conservation invariant for every asset ever touched.
    pub fn verify_all(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .into_iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }
}
