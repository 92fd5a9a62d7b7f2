//! Serde helpers for the geth JSON conventions: `0x`-prefixed byte strings
//! and quantities that may be written either in hex or in decimal.

/// `0x`-prefixed hex byte strings. The prefix is optional when reading.
pub mod hex_bytes {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    /// Serializes bytes as a `0x`-prefixed lowercase hex string.
    pub fn serialize<S: Serializer, T>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: hex::ToHex,
    {
        let s = data.encode_hex::<String>();
        serializer.serialize_str(&format!("0x{}", s))
    }

    /// Deserializes a hex string, with or without its `0x` prefix.
    pub fn deserialize<'de, D: Deserializer<'de>, T>(deserializer: D) -> Result<T, D::Error>
    where
        T: hex::FromHex,
        T::Error: std::fmt::Display,
    {
        let s = String::deserialize(deserializer)?;
        match s.strip_prefix("0x") {
            Some(rest) => T::from_hex(rest),
            None => T::from_hex(&*s),
        }
        .map_err(D::Error::custom)
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Number(u64),
    Text(String),
}

/// `u64` quantities. Written as `0x`-prefixed hex, read from hex strings,
/// decimal strings or plain JSON numbers.
pub mod quantity {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    use super::NumberRepr;

    /// Serializes a quantity as `0x`-prefixed hex without leading zeros.
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    /// Deserializes a hex string, a decimal string or a JSON number.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match NumberRepr::deserialize(deserializer)? {
            NumberRepr::Number(n) => Ok(n),
            NumberRepr::Text(s) => match s.strip_prefix("0x") {
                Some(rest) => u64::from_str_radix(rest, 16),
                None => s.parse(),
            }
            .map_err(D::Error::custom),
        }
    }
}

/// [`U256`](ethereum_types::U256) quantities read from hex strings, decimal
/// strings or plain JSON numbers.
pub mod u256_hex_or_decimal {
    use ethereum_types::U256;
    use serde::{de::Error as _, Deserialize as _, Deserializer};

    use super::NumberRepr;

    /// Deserializes a hex string, a decimal string or a JSON number.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match NumberRepr::deserialize(deserializer)? {
            NumberRepr::Number(n) => Ok(U256::from(n)),
            NumberRepr::Text(s) => match s.strip_prefix("0x") {
                Some(rest) => U256::from_str_radix(rest, 16).map_err(D::Error::custom),
                None => U256::from_dec_str(&s).map_err(D::Error::custom),
            },
        }
    }
}
