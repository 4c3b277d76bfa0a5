//! System-wide constants for the poolkeep custody ledger.

/// Maximum items in a single batch payin or payout (default).
pub const MAX_BATCH_SIZE: usize = 25;

/// Basis-point denominator for transfer fee configuration.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Domain separator for audit record digests.
pub const AUDIT_DOMAIN: &[u8] = b"poolkeep:audit:v1:";

/// Digest preceding the first audit record.
pub const GENESIS_DIGEST: [u8; 32] = [0u8; 32];
