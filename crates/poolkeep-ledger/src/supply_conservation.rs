//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced for every asset:
//! ```text
//! ∀ asset: poolBalance[asset] == Σ(credited) − Σ(debited)
//! ```
//!
//! The totals are kept independently of the balance map so that a code path
//! mutating one without the other is caught by [`SupplyConservation::verify`].
//!
//! Totals accumulate modulo 2^256. A balance always fits in 256 bits, so
//! the modular difference of the totals equals it exactly however much
//! value has flowed through the pool.

use std::collections::{BTreeSet, HashMap};

use poolkeep_types::{Amount, AssetId, PoolError, Result};

/// Tracks per-asset cumulative credits and debits since initialization.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    credited: HashMap<AssetId, Amount>,
    debited: HashMap<AssetId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_credit(&mut self, asset: AssetId, amount: Amount) {
        let total = self.credited.entry(asset).or_default();
        *total = total.wrapping_add(amount);
    }

    pub fn record_debit(&mut self, asset: AssetId, amount: Amount) {
        let total = self.debited.entry(asset).or_default();
        *total = total.wrapping_add(amount);
    }

    /// Expected pool balance: credited − debited.
    #[must_use]
    pub fn expected_supply(&self, asset: AssetId) -> Amount {
        self.total_credited(asset)
            .wrapping_sub(self.total_debited(asset))
    }

    /// Verify that the actual pool balance matches credited − debited.
    ///
    /// # Errors
    /// Returns [`PoolError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: AssetId, actual: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual != expected {
            return Err(PoolError::SupplyInvariantViolation {
                reason: format!(
                    "asset {asset}: balance {actual} != expected {expected} \
                     (credited={}, debited={})",
                    self.total_credited(asset),
                    self.total_debited(asset),
                ),
            });
        }
        Ok(())
    }

    /// Every asset that has ever been credited or debited.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        let mut assets: BTreeSet<AssetId> = self.credited.keys().copied().collect();
        assets.extend(self.debited.keys().copied());
        assets.into_iter().collect()
    }

    #[must_use]
    pub fn total_credited(&self, asset: AssetId) -> Amount {
        self.credited.get(&asset).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_debited(&self, asset: AssetId) -> Amount {
        self.debited.get(&asset).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: u64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        assert_eq!(sc.expected_supply(AssetId::NATIVE), Amount::ZERO);
        assert!(sc.verify(AssetId::NATIVE, Amount::ZERO).is_ok());
    }

    #[test]
    fn credits_and_debits_net_out() {
        let mut sc = SupplyConservation::new();
        sc.record_credit(AssetId::NATIVE, units(1_000));
        sc.record_credit(AssetId::NATIVE, units(500));
        sc.record_debit(AssetId::NATIVE, units(300));
        assert_eq!(sc.expected_supply(AssetId::NATIVE), units(1_200));
        assert!(sc.verify(AssetId::NATIVE, units(1_200)).is_ok());
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut sc = SupplyConservation::new();
        sc.record_credit(AssetId::NATIVE, units(10));
        let err = sc.verify(AssetId::NATIVE, units(11)).unwrap_err();
        assert!(matches!(err, PoolError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn over_debit_is_a_violation() {
        let mut sc = SupplyConservation::new();
        sc.record_debit(AssetId::NATIVE, units(1));
        assert!(matches!(
            sc.verify(AssetId::NATIVE, Amount::ZERO).unwrap_err(),
            PoolError::SupplyInvariantViolation { .. }
        ));
    }

    #[test]
    fn multiple_assets_independent() {
        let token = AssetId::random();
        let mut sc = SupplyConservation::new();
        sc.record_credit(AssetId::NATIVE, units(5));
        sc.record_credit(token, units(50_000));
        assert!(sc.verify(AssetId::NATIVE, units(5)).is_ok());
        assert!(sc.verify(token, units(50_000)).is_ok());
        assert_eq!(sc.tracked_assets().len(), 2);
    }

    #[test]
    fn churn_beyond_the_amount_range_stays_exact() {
        let mut sc = SupplyConservation::new();
        // Move the whole range in and out twice, then leave 7 behind.
        for _ in 0..2 {
            sc.record_credit(AssetId::NATIVE, Amount::MAX);
            sc.record_debit(AssetId::NATIVE, Amount::MAX);
        }
        sc.record_credit(AssetId::NATIVE, Amount::MAX);
        sc.record_debit(AssetId::NATIVE, Amount::MAX - units(7));
        assert_eq!(sc.expected_supply(AssetId::NATIVE), units(7));
        sc.verify(AssetId::NATIVE, units(7)).unwrap();
    }
}
