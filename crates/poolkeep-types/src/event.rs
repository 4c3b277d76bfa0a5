//! Audit record types for the poolkeep journal.
//!
//! Every committed state change produces one [`PoolEvent`]. The journal
//! wraps each event in an [`AuditRecord`] carrying its position, time, and
//! a SHA-256 digest chained to the previous record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, AssetId, EventId, Role};

/// A state change the pool committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolEvent {
    /// Value entered the pool through a deposit entry point.
    Deposited {
        actor: Address,
        asset: AssetId,
        #[serde(with = "crate::amount_serde")]
        requested: Amount,
        #[serde(with = "crate::amount_serde")]
        received: Amount,
    },
    /// Value left the pool through a single withdrawal.
    Withdrawn {
        actor: Address,
        asset: AssetId,
        #[serde(with = "crate::amount_serde")]
        amount: Amount,
        recipient: Address,
    },
    AssetAdded {
        actor: Address,
        asset: AssetId,
    },
    AssetRemoved {
        actor: Address,
        asset: AssetId,
    },
    WithdrawLimitSet {
        actor: Address,
        asset: AssetId,
        #[serde(with = "crate::amount_serde")]
        limit: Amount,
    },
    /// One item of a batch payin.
    BatchPayin {
        actor: Address,
        index: usize,
        from: Address,
        asset: AssetId,
        #[serde(with = "crate::amount_serde")]
        requested: Amount,
        #[serde(with = "crate::amount_serde")]
        received: Amount,
    },
    /// One item of a batch payout.
    BatchPayout {
        actor: Address,
        index: usize,
        recipient: Address,
        asset: AssetId,
        #[serde(with = "crate::amount_serde")]
        amount: Amount,
    },
    Paused {
        actor: Address,
    },
    Unpaused {
        actor: Address,
    },
    RoleGranted {
        actor: Address,
        account: Address,
        role: Role,
    },
    RoleRevoked {
        actor: Address,
        account: Address,
        role: Role,
    },
}

impl PoolEvent {
    /// The identity that caused this event.
    #[must_use]
    pub fn actor(&self) -> Address {
        match self {
            Self::Deposited { actor, .. }
            | Self::Withdrawn { actor, .. }
            | Self::AssetAdded { actor, .. }
            | Self::AssetRemoved { actor, .. }
            | Self::WithdrawLimitSet { actor, .. }
            | Self::BatchPayin { actor, .. }
            | Self::BatchPayout { actor, .. }
            | Self::Paused { actor }
            | Self::Unpaused { actor }
            | Self::RoleGranted { actor, .. }
            | Self::RoleRevoked { actor, .. } => *actor,
        }
    }

    /// The asset this event concerns, if any.
    #[must_use]
    pub fn asset(&self) -> Option<AssetId> {
        match self {
            Self::Deposited { asset, .. }
            | Self::Withdrawn { asset, .. }
            | Self::AssetAdded { asset, .. }
            | Self::AssetRemoved { asset, .. }
            | Self::WithdrawLimitSet { asset, .. }
            | Self::BatchPayin { asset, .. }
            | Self::BatchPayout { asset, .. } => Some(*asset),
            Self::Paused { .. }
            | Self::Unpaused { .. }
            | Self::RoleGranted { .. }
            | Self::RoleRevoked { .. } => None,
        }
    }

    /// Stable kind label used in logs.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Deposited { .. } => EventKind::Deposited,
            Self::Withdrawn { .. } => EventKind::Withdrawn,
            Self::AssetAdded { .. } => EventKind::AssetAdded,
            Self::AssetRemoved { .. } => EventKind::AssetRemoved,
            Self::WithdrawLimitSet { .. } => EventKind::WithdrawLimitSet,
            Self::BatchPayin { .. } => EventKind::BatchPayin,
            Self::BatchPayout { .. } => EventKind::BatchPayout,
            Self::Paused { .. } => EventKind::Paused,
            Self::Unpaused { .. } => EventKind::Unpaused,
            Self::RoleGranted { .. } => EventKind::RoleGranted,
            Self::RoleRevoked { .. } => EventKind::RoleRevoked,
        }
    }
}

/// Discriminant of [`PoolEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Deposited,
    Withdrawn,
    AssetAdded,
    AssetRemoved,
    WithdrawLimitSet,
    BatchPayin,
    BatchPayout,
    Paused,
    Unpaused,
    RoleGranted,
    RoleRevoked,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Deposited => "DEPOSITED",
            Self::Withdrawn => "WITHDRAWN",
            Self::AssetAdded => "ASSET_ADDED",
            Self::AssetRemoved => "ASSET_REMOVED",
            Self::WithdrawLimitSet => "WITHDRAW_LIMIT_SET",
            Self::BatchPayin => "BATCH_PAYIN",
            Self::BatchPayout => "BATCH_PAYOUT",
            Self::Paused => "PAUSED",
            Self::Unpaused => "UNPAUSED",
            Self::RoleGranted => "ROLE_GRANTED",
            Self::RoleRevoked => "ROLE_REVOKED",
        };
        f.write_str(label)
    }
}

/// A journaled, hash-chained audit record.
///
/// `digest` commits to `prev_digest`, `sequence`, and the serialized event,
/// so any edit to a past record breaks every digest after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: EventId,
    /// Zero-based position in the journal.
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: PoolEvent,
    pub prev_digest: [u8; 32],
    pub digest: [u8; 32],
}

impl AuditRecord {
    /// Hex form of the digest, for logs.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolEvent {
        PoolEvent::BatchPayin {
            actor: Address::from_bytes([1; 20]),
            index: 2,
            from: Address::from_bytes([2; 20]),
            asset: AssetId::from_bytes([3; 20]),
            requested: Amount::from(1_000),
            received: Amount::from(990),
        }
    }

    #[test]
    fn accessors() {
        let event = sample();
        assert_eq!(event.actor(), Address::from_bytes([1; 20]));
        assert_eq!(event.asset(), Some(AssetId::from_bytes([3; 20])));
        assert_eq!(event.kind(), EventKind::BatchPayin);
        assert_eq!(event.kind().to_string(), "BATCH_PAYIN");

        let paused = PoolEvent::Paused {
            actor: Address::ZERO,
        };
        assert_eq!(paused.asset(), None);
    }

    #[test]
    fn event_serializes_with_snake_case_tag() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.starts_with("{\"batch_payin\""), "Got: {json}");
        let back: PoolEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
