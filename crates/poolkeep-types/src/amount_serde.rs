//! Serde adapter for [`Amount`](crate::Amount) fields.
//!
//! Amounts are written as decimal strings so every 256-bit value survives
//! JSON. On input a field accepts a JSON integer up to `u64::MAX`, a
//! decimal string, or a `0x`-prefixed hex string:
//!
//! ```json
//! { "amount": 1000 }
//! { "amount": "340282366920938463463374607431768211456" }
//! { "amount": "0x3e8" }
//! ```
//!
//! The adapter only asks the deserializer for primitive integers and
//! strings, so it also works inside internally tagged enums.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serializer, de};

use crate::Amount;

pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    deserializer.deserialize_any(AmountVisitor)
}

struct AmountVisitor;

impl de::Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer, or a decimal or 0x-hex integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(Amount::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v.trim()).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// The same encoding for `Vec<Amount>` fields.
pub mod vec {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Amount;

    pub fn serialize<S: Serializer>(amounts: &[Amount], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(amounts.iter().map(ToString::to_string))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Amount>, D::Error> {
        let items = Vec::<super::Wrapped>::deserialize(deserializer)?;
        Ok(items.into_iter().map(|super::Wrapped(amount)| amount).collect())
    }
}

#[derive(Deserialize)]
struct Wrapped(#[serde(deserialize_with = "deserialize")] Amount);
