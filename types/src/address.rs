//! Account address type with `erd1` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Lowercase bech32 data alphabet.
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// A bech32 account address, always prefixed with `erd1`.
///
/// Only the shape is validated (prefix, length, alphabet); the checksum is
/// left to the chain, which rejects transactions for unknown accounts anyway.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Human-readable part plus the bech32 separator.
    pub const PREFIX: &'static str = "erd1";

    /// Total length of an encoded 32-byte account address.
    pub const LEN: usize = 62;

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        let Some(data) = raw.strip_prefix(Self::PREFIX) else {
            return Err(TypesError::InvalidAddress(format!(
                "{raw}: missing {} prefix",
                Self::PREFIX
            )));
        };
        if raw.len() != Self::LEN {
            return Err(TypesError::InvalidAddress(format!(
                "{raw}: expected {} characters, got {}",
                Self::LEN,
                raw.len()
            )));
        }
        if let Some(bad) = data.chars().find(|c| !BECH32_CHARSET.contains(*c)) {
            return Err(TypesError::InvalidAddress(format!(
                "{raw}: invalid character {bad:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
