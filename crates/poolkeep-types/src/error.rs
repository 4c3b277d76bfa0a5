//! Error types for the poolkeep custody ledger.
//!
//! All errors use the `PK_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access errors (pause, reentrancy, roles)
//! - 2xx: Asset registry errors
//! - 3xx: Amount / balance errors
//! - 4xx: Withdrawal policy errors
//! - 5xx: Transfer errors
//! - 6xx: Batch settlement errors
//! - 9xx: General / internal errors
//!
//! Every error is a synchronous, non-retryable rejection of the call that
//! produced it. A call that fails leaves no state behind.

use thiserror::Error;

use crate::{Address, Amount, AssetId, Role};

/// Central error enum for all poolkeep operations.
#[derive(Debug, Error)]
pub enum PoolError {
    // =================================================================
    // Access Errors (1xx)
    // =================================================================
    /// Value-moving operations are disabled.
    #[error("PK_ERR_100: Pool is paused")]
    Paused,

    /// `unpause` was called on a running pool.
    #[error("PK_ERR_101: Pool is not paused")]
    NotPaused,

    /// `pause` was called on a paused pool.
    #[error("PK_ERR_102: Pool is already paused")]
    AlreadyPaused,

    /// A call re-entered the pool while another operation was in progress.
    #[error("PK_ERR_103: Reentrant call rejected")]
    Reentrant,

    /// The caller lacks the role the operation requires.
    #[error("PK_ERR_104: {account} is missing role {role}")]
    MissingRole { account: Address, role: Role },

    // =================================================================
    // Asset Errors (2xx)
    // =================================================================
    /// The asset identifier is null or not usable for this operation.
    #[error("PK_ERR_200: Invalid asset: {0}")]
    InvalidAsset(AssetId),

    /// The asset is not in the supported set.
    #[error("PK_ERR_201: Asset not supported: {0}")]
    NotSupported(AssetId),

    /// The asset is already in the supported set.
    #[error("PK_ERR_202: Asset already supported: {0}")]
    AlreadySupported(AssetId),

    /// The asset still has a non-zero pool balance.
    #[error("PK_ERR_203: Pool balance of {asset} is not empty: {balance}")]
    PoolNotEmpty { asset: AssetId, balance: Amount },

    /// The native asset cannot leave the supported set.
    #[error("PK_ERR_204: Native asset cannot be removed")]
    NativeAssetPinned,

    // =================================================================
    // Amount / Balance Errors (3xx)
    // =================================================================
    /// Amounts must be strictly positive.
    #[error("PK_ERR_300: Amount must be greater than zero")]
    ZeroAmount,

    /// The recipient is the null identity.
    #[error("PK_ERR_301: Invalid recipient")]
    InvalidRecipient,

    /// The sender of a batch payin is the null identity.
    #[error("PK_ERR_302: Invalid sender")]
    InvalidSender,

    /// The pool does not hold enough of the asset.
    #[error("PK_ERR_303: Insufficient pool balance of {asset}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    /// Ledger balance diverged from credited minus debited. Critical.
    #[error("PK_ERR_305: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Withdrawal Policy Errors (4xx)
    // =================================================================
    /// No operator limit is configured for the asset.
    #[error("PK_ERR_400: No operator withdraw limit set for {0}")]
    LimitNotSet(AssetId),

    /// The amount exceeds the operator limit for the asset.
    #[error("PK_ERR_401: Withdraw of {requested} exceeds operator limit {limit} for {asset}")]
    LimitExceeded {
        asset: AssetId,
        requested: Amount,
        limit: Amount,
    },

    // =================================================================
    // Transfer Errors (5xx)
    // =================================================================
    /// The transfer-in delivered nothing to the pool.
    #[error("PK_ERR_500: Transfer of {asset} delivered nothing")]
    ZeroReceived { asset: AssetId },

    /// The transfer-in delivered more than requested: a malformed asset.
    #[error("PK_ERR_501: Transfer of {asset} over-delivered: requested {requested}, received {received}")]
    OverReceived {
        asset: AssetId,
        requested: Amount,
        received: Amount,
    },

    /// The external transfer primitive reported a failure.
    #[error("PK_ERR_502: Transfer of {asset} failed: {reason}")]
    TransferFailed { asset: AssetId, reason: String },

    /// Value sent to the pool outside the deposit entry points.
    #[error("PK_ERR_503: Unsolicited transfer from {from} rejected")]
    UnsolicitedTransfer { from: Address },

    // =================================================================
    // Batch Errors (6xx)
    // =================================================================
    /// Parallel batch arrays differ in length.
    #[error("PK_ERR_600: Batch array length mismatch: {first}, {second}, {third}")]
    ArrayLengthMismatch {
        first: usize,
        second: usize,
        third: usize,
    },

    /// The batch exceeds the configured maximum size.
    #[error("PK_ERR_601: Batch of {len} items exceeds maximum {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// A single item failed; the whole batch was rejected.
    #[error("PK_ERR_602: Batch item {index} failed: {source}")]
    BatchItemFailed {
        index: usize,
        #[source]
        source: Box<PoolError>,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PK_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PK_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("PK_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("PK_ERR_903: I/O error: {0}")]
    Io(String),
}

impl PoolError {
    /// Wrap an item-level failure with its batch position.
    #[must_use]
    pub fn at_item(self, index: usize) -> Self {
        Self::BatchItemFailed {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through batch item wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::BatchItemFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PoolError>;

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let msg = format!("{}", PoolError::Paused);
        assert!(msg.starts_with("PK_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = PoolError::InsufficientBalance {
            asset: AssetId::NATIVE,
            needed: Amount::from(100),
            available: Amount::from(50),
        };
        let msg = format!("{err}");
        assert!(msg.contains("PK_ERR_303"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
        assert!(msg.contains("native"));
    }

    #[test]
    fn missing_role_display() {
        let err = PoolError::MissingRole {
            account: Address::from_bytes([1u8; 20]),
            role: Role::Operator,
        };
        let msg = format!("{err}");
        assert!(msg.contains("PK_ERR_104"));
        assert!(msg.contains("OPERATOR"));
    }

    #[test]
    fn batch_item_wraps_and_unwraps() {
        let err = PoolError::ZeroAmount.at_item(3);
        let msg = format!("{err}");
        assert!(msg.starts_with("PK_ERR_602"));
        assert!(msg.contains("item 3"));
        assert!(matches!(err.root(), PoolError::ZeroAmount));
    }

    #[test]
    fn all_errors_have_pk_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(PoolError::Reentrant),
            Box::new(PoolError::NativeAssetPinned),
            Box::new(PoolError::LimitNotSet(AssetId::NATIVE)),
            Box::new(PoolError::BatchTooLarge { len: 26, max: 25 }),
            Box::new(PoolError::Internal("test".into())),
            Box::new(PoolError::UnsolicitedTransfer {
                from: Address::ZERO,
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("PK_ERR_"),
                "Error missing PK_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn serde_json_error_converts() {
        let err: PoolError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(matches!(err, PoolError::Serialization(_)));
    }
}
