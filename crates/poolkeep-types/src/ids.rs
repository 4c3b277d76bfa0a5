//! Identifiers used throughout poolkeep.
//!
//! Accounts and assets are 20-byte handles rendered as `0x`-prefixed hex,
//! compared by equality only. Audit records use UUIDv7 for time-ordered
//! sorting.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::PoolError;

/// Parse a `0x`-prefixed (or bare) 40-character hex string into 20 bytes.
fn parse_handle(s: &str) -> Result<[u8; 20], PoolError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits)
        .map_err(|e| PoolError::Serialization(format!("invalid hex handle {s:?}: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        PoolError::Serialization(format!("handle {s:?} is {} bytes, expected 20", b.len()))
    })
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An authenticated caller, depositor, or payout recipient.
///
/// Authentication happens upstream; the pool only ever sees a stable
/// identity. [`Address::ZERO`] is the null identity and is never a valid
/// recipient or sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null identity.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// First four bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// A random non-zero address.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        loop {
            let candidate = Self(rand::random());
            if !candidate.is_zero() {
                return candidate;
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_handle(s).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Opaque handle naming a fungible asset kind.
///
/// [`AssetId::NATIVE`] is the reserved sentinel for the chain's base
/// currency; every other value names an externally issued token.
/// [`AssetId::ZERO`] is never a valid asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct AssetId(pub [u8; 20]);

impl AssetId {
    /// The null identifier.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Native currency sentinel (`0xeeee…eeee`).
    pub const NATIVE: Self = Self([0xee; 20]);

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    /// A random token identifier (never zero, never native).
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        loop {
            let candidate = Self(rand::random());
            if !candidate.is_zero() && !candidate.is_native() {
                return candidate;
            }
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

impl FromStr for AssetId {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(Self::NATIVE);
        }
        parse_handle(s).map(Self)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// Unique identifier for an audit record. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display_parse() {
        let addr = Address::from_bytes([0xab; 20]);
        let s = addr.to_string();
        assert_eq!(s, format!("0x{}", "ab".repeat(20)));
        let back: Address = s.parse().unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn address_parse_rejects_wrong_length() {
        let err = "0xabcd".parse::<Address>().unwrap_err();
        assert!(matches!(err, PoolError::Serialization(_)));
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn native_sentinel_is_distinct() {
        assert!(AssetId::NATIVE.is_native());
        assert!(!AssetId::NATIVE.is_zero());
        assert_ne!(AssetId::NATIVE, AssetId::ZERO);
        assert!(!AssetId::random().is_native());
    }

    #[test]
    fn asset_id_native_alias() {
        assert_eq!("native".parse::<AssetId>().unwrap(), AssetId::NATIVE);
        assert_eq!(
            format!("0x{}", "ee".repeat(20)).parse::<AssetId>().unwrap(),
            AssetId::NATIVE
        );
        assert_eq!(AssetId::NATIVE.to_string(), "native");
    }

    #[test]
    fn handles_serialize_as_hex_strings() {
        let asset = AssetId::from_bytes([0x11; 20]);
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(asset, back);
    }

    #[test]
    fn random_address_is_never_zero() {
        for _ in 0..64 {
            assert!(!Address::random().is_zero());
        }
    }

    #[test]
    fn event_id_ordering() {
        let a = EventId::new();
        let b = EventId::new();
        assert!(a < b);
    }
}
