//! Supported-asset set and operator withdraw limits.
//!
//! The native sentinel is supported from construction and cannot be
//! removed. Enumeration follows insertion order until a removal, which
//! swaps the last entry into the removed slot.

use std::collections::HashMap;

use poolkeep_access::RoleRegistry;
use poolkeep_types::{Address, Amount, AssetId, PoolError, Result, Role};

use crate::Ledger;

/// Which assets the pool accepts, and how much an operator may withdraw.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    /// Asset → position in `listed`.
    index: HashMap<AssetId, usize>,
    listed: Vec<AssetId>,
    withdraw_limits: HashMap<AssetId, Amount>,
}

impl AssetRegistry {
    /// Create a registry supporting only the native asset.
    #[must_use]
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(AssetId::NATIVE, 0);
        Self {
            index,
            listed: vec![AssetId::NATIVE],
            withdraw_limits: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_supported(&self, asset: AssetId) -> bool {
        self.index.contains_key(&asset)
    }

    /// Fail with `NotSupported` unless `asset` is supported.
    pub fn require_supported(&self, asset: AssetId) -> Result<()> {
        if self.is_supported(asset) {
            Ok(())
        } else {
            Err(PoolError::NotSupported(asset))
        }
    }

    /// Supported assets in enumeration order.
    #[must_use]
    pub fn list(&self) -> &[AssetId] {
        &self.listed
    }

    /// Operator withdraw limit for `asset`; zero if never set.
    #[must_use]
    pub fn withdraw_limit(&self, asset: AssetId) -> Amount {
        self.withdraw_limits.get(&asset).copied().unwrap_or_default()
    }

    /// Support a new asset. Admin-only.
    ///
    /// # Errors
    /// - `MissingRole` unless `caller` is Admin
    /// - `InvalidAsset` for the null identifier
    /// - `AlreadySupported` if present
    pub fn add(&mut self, roles: &RoleRegistry, caller: Address, asset: AssetId) -> Result<()> {
        roles.require(caller, Role::Admin)?;
        if asset.is_zero() {
            return Err(PoolError::InvalidAsset(asset));
        }
        if self.is_supported(asset) {
            return Err(PoolError::AlreadySupported(asset));
        }
        self.index.insert(asset, self.listed.len());
        self.listed.push(asset);
        Ok(())
    }

    /// Stop supporting an asset whose pool balance is zero. Admin-only.
    ///
    /// # Errors
    /// - `MissingRole` unless `caller` is Admin
    /// - `NotSupported` if absent
    /// - `NativeAssetPinned` for the native sentinel
    /// - `PoolNotEmpty` if the ledger still holds any of it
    pub fn remove(
        &mut self,
        roles: &RoleRegistry,
        caller: Address,
        asset: AssetId,
        ledger: &Ledger,
    ) -> Result<()> {
        roles.require(caller, Role::Admin)?;
        let Some(&slot) = self.index.get(&asset) else {
            return Err(PoolError::NotSupported(asset));
        };
        if asset.is_native() {
            return Err(PoolError::NativeAssetPinned);
        }
        let balance = ledger.balance(asset);
        if !balance.is_zero() {
            return Err(PoolError::PoolNotEmpty { asset, balance });
        }

        self.listed.swap_remove(slot);
        self.index.remove(&asset);
        if let Some(moved) = self.listed.get(slot) {
            self.index.insert(*moved, slot);
        }
        Ok(())
    }

    /// Set the operator withdraw limit. Admin-only, unconditional:
    /// the asset need not be supported, and zero disables operator withdrawals.
    pub fn set_withdraw_limit(
        &mut self,
        roles: &RoleRegistry,
        caller: Address,
        asset: AssetId,
        limit: Amount,
    ) -> Result<()> {
        roles.require(caller, Role::Admin)?;
        self.withdraw_limits.insert(asset, limit);
        Ok(())
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AssetRegistry, RoleRegistry, Address) {
        let admin = Address::random();
        (AssetRegistry::new(), RoleRegistry::new(admin), admin)
    }

    #[test]
    fn native_supported_from_start() {
        let (assets, _, _) = setup();
        assert!(assets.is_supported(AssetId::NATIVE));
        assert_eq!(assets.list(), &[AssetId::NATIVE]);
    }

    #[test]
    fn add_appends_in_order() {
        let (mut assets, roles, admin) = setup();
        let a = AssetId::random();
        let b = AssetId::random();
        assets.add(&roles, admin, a).unwrap();
        assets.add(&roles, admin, b).unwrap();
        assert_eq!(assets.list(), &[AssetId::NATIVE, a, b]);
    }

    #[test]
    fn add_rejects_zero_and_duplicates() {
        let (mut assets, roles, admin) = setup();
        assert!(matches!(
            assets.add(&roles, admin, AssetId::ZERO).unwrap_err(),
            PoolError::InvalidAsset(_)
        ));
        assert!(matches!(
            assets.add(&roles, admin, AssetId::NATIVE).unwrap_err(),
            PoolError::AlreadySupported(_)
        ));
    }

    #[test]
    fn add_requires_admin() {
        let (mut assets, roles, _) = setup();
        let err = assets.add(&roles, Address::random(), AssetId::random()).unwrap_err();
        assert!(matches!(err, PoolError::MissingRole { role: Role::Admin, .. }));
        assert_eq!(assets.list().len(), 1);
    }

    #[test]
    fn remove_swaps_last_into_slot() {
        let (mut assets, roles, admin) = setup();
        let ledger = Ledger::new();
        let a = AssetId::random();
        let b = AssetId::random();
        let c = AssetId::random();
        for asset in [a, b, c] {
            assets.add(&roles, admin, asset).unwrap();
        }

        assets.remove(&roles, admin, a, &ledger).unwrap();
        assert_eq!(assets.list(), &[AssetId::NATIVE, c, b]);
        assert!(!assets.is_supported(a));

        // Index of the moved entry was updated.
        assets.remove(&roles, admin, c, &ledger).unwrap();
        assert_eq!(assets.list(), &[AssetId::NATIVE, b]);
    }

    #[test]
    fn remove_last_entry() {
        let (mut assets, roles, admin) = setup();
        let a = AssetId::random();
        assets.add(&roles, admin, a).unwrap();
        assets.remove(&roles, admin, a, &Ledger::new()).unwrap();
        assert_eq!(assets.list(), &[AssetId::NATIVE]);
        assets.add(&roles, admin, a).unwrap();
        assert_eq!(assets.list(), &[AssetId::NATIVE, a]);
    }

    #[test]
    fn remove_requires_empty_pool() {
        let (mut assets, roles, admin) = setup();
        let token = AssetId::random();
        assets.add(&roles, admin, token).unwrap();
        let mut ledger = Ledger::new();
        let five = Amount::from(5);
        ledger.credit(&assets, token, five).unwrap();

        let err = assets.remove(&roles, admin, token, &ledger).unwrap_err();
        assert!(matches!(err, PoolError::PoolNotEmpty { balance, .. } if balance == five));

        ledger.debit(&assets, token, five).unwrap();
        assets.remove(&roles, admin, token, &ledger).unwrap();
        assert!(!assets.list().contains(&token));
    }

    #[test]
    fn native_is_pinned() {
        let (mut assets, roles, admin) = setup();
        let err = assets
            .remove(&roles, admin, AssetId::NATIVE, &Ledger::new())
            .unwrap_err();
        assert!(matches!(err, PoolError::NativeAssetPinned));
        assert!(assets.is_supported(AssetId::NATIVE));
    }

    #[test]
    fn remove_unknown_fails() {
        let (mut assets, roles, admin) = setup();
        let err = assets
            .remove(&roles, admin, AssetId::random(), &Ledger::new())
            .unwrap_err();
        assert!(matches!(err, PoolError::NotSupported(_)));
    }

    #[test]
    fn withdraw_limit_is_unconditional() {
        let (mut assets, roles, admin) = setup();
        let unsupported = AssetId::random();
        assert_eq!(assets.withdraw_limit(unsupported), Amount::ZERO);
        assets.set_withdraw_limit(&roles, admin, unsupported, Amount::from(42)).unwrap();
        assert_eq!(assets.withdraw_limit(unsupported), Amount::from(42));
        assets.set_withdraw_limit(&roles, admin, unsupported, Amount::ZERO).unwrap();
        assert_eq!(assets.withdraw_limit(unsupported), Amount::ZERO);
    }
}
