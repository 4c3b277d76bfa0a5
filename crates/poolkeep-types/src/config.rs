//! Configuration types for a pool instance.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, AssetId, PoolError, Result, constants};

/// Initialization parameters for a single pool instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// The identity granted every role at initialization.
    pub admin: Address,
    /// Upper bound on batch payin / payout length.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Operator withdraw limit for the native asset.
    #[serde(default, with = "crate::amount_serde")]
    pub native_withdraw_limit: Amount,
    /// Tokens supported from initialization, in enumeration order.
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

/// A token supported from initialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetConfig {
    pub asset: AssetId,
    /// Operator withdraw limit; zero disables operator withdrawals.
    #[serde(default, with = "crate::amount_serde")]
    pub withdraw_limit: Amount,
}

fn default_max_batch_size() -> usize {
    constants::MAX_BATCH_SIZE
}

impl PoolConfig {
    /// Minimal config: the given admin, default batch bound, native only.
    #[must_use]
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            max_batch_size: constants::MAX_BATCH_SIZE,
            native_withdraw_limit: Amount::ZERO,
            assets: Vec::new(),
        }
    }

    /// Add a token supported from initialization.
    #[must_use]
    pub fn with_asset(mut self, asset: AssetId, withdraw_limit: Amount) -> Self {
        self.assets.push(AssetConfig {
            asset,
            withdraw_limit,
        });
        self
    }

    /// Check structural validity.
    pub fn validate(&self) -> Result<()> {
        if self.admin.is_zero() {
            return Err(PoolError::Configuration("admin must not be the zero address".into()));
        }
        if self.max_batch_size == 0 {
            return Err(PoolError::Configuration("max_batch_size must be > 0".into()));
        }
        let mut seen = HashSet::new();
        for entry in &self.assets {
            if entry.asset.is_zero() || entry.asset.is_native() {
                return Err(PoolError::Configuration(format!(
                    "asset {} cannot be listed explicitly",
                    entry.asset
                )));
            }
            if !seen.insert(entry.asset) {
                return Err(PoolError::Configuration(format!(
                    "asset {} listed twice",
                    entry.asset
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
