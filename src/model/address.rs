//! 20-byte account address

use crate::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An Ethereum-style 20-byte account address
///
/// Parsed from 40 hex characters with or without a `0x` prefix; displayed as
/// lowercase `0x`-prefixed hex. Ordering is byte order, so maps keyed by
/// `Address` iterate deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The null address
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Left-pad to a 32-byte ABI word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse an address string. The zero address is accepted here; callers
    /// that forbid it check [`Address::is_zero`].
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let cleaned = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if cleaned.len() != 40 {
            return Err(Error::input(format!(
                "invalid address length: expected 40 hex chars, got {}",
                cleaned.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(cleaned, &mut bytes)
            .map_err(|e| Error::input(format!("invalid address {trimmed:?}: {e}")))?;
        Ok(Address(bytes))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::parse(&s).map_err(de::Error::custom)
        } else {
            <[u8; 20]>::deserialize(deserializer).map(Address)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_prefix() {
        let a = Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        let b = Address::parse("1234567890ABCDEF1234567890ABCDEF12345678").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), "0x1234567890abcdef1234567890abcdef12345678");
    }

    #[test]
    fn test_parse_invalid_length() {
        assert!(matches!(
            Address::parse("0x1234"),
            Err(Error::Input { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_hex() {
        assert!(Address::parse("0xzz34567890abcdef1234567890abcdef12345678").is_err());
    }

    #[test]
    fn test_to_word_left_pads() {
        let addr = Address::from_bytes([0xab; 20]);
        let word = addr.to_word();
        assert_eq!(word[..12], [0u8; 12]);
        assert_eq!(word[12..], [0xab; 20]);
    }

    #[test]
    fn test_zero_address() {
        let zero = Address::parse("0x0000000000000000000000000000000000000000").unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero, Address::ZERO);
    }
}
