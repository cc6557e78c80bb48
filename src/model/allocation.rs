//! Allocations and their canonical leaf encoding
//!
//! A leaf commits to one `(address, amount)` pair as
//! `keccak256(keccak256(abi.encode(address, uint256)))`. The double hash keeps
//! a 64-byte internal node preimage from ever being accepted as a leaf.

use super::{Address, Hash};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Identifier recorded in tree artifacts for the leaf encoding below
pub const LEAF_ENCODING: &str = "abi(address,uint256)/keccak256x2";

/// One committed allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub address: Address,
    #[serde(with = "amount_serde")]
    pub amount: u128,
}

impl Allocation {
    pub fn new(address: Address, amount: u128) -> Self {
        Allocation { address, amount }
    }

    /// Parse an allocation from its textual parts, enforcing the build-time
    /// rules: non-zero address and a positive amount that fits in u128.
    pub fn parse(address: &str, amount: &str) -> Result<Self> {
        let address = Address::parse(address)?;
        if address.is_zero() {
            return Err(Error::input("zero address cannot receive an allocation"));
        }
        let amount = parse_amount(amount)?;
        if amount == 0 {
            return Err(Error::input(format!("zero amount for {address}")));
        }
        Ok(Allocation { address, amount })
    }

    /// ABI encoding: 32-byte padded address followed by the 32-byte
    /// big-endian amount
    pub fn encode(&self) -> [u8; 64] {
        encode(&self.address, self.amount)
    }

    pub fn leaf_hash(&self) -> Hash {
        leaf_hash(&self.address, self.amount)
    }
}

/// ABI-encode `(address, uint256)`
pub fn encode(address: &Address, amount: u128) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&address.to_word());
    out[48..].copy_from_slice(&amount.to_be_bytes());
    out
}

/// Double-hashed leaf for `(address, amount)`
///
/// Must stay byte-identical between tree construction and claim
/// verification; any drift invalidates every issued proof.
pub fn leaf_hash(address: &Address, amount: u128) -> Hash {
    let inner = Hash::digest(&encode(address, amount));
    Hash::digest(inner.as_bytes())
}

/// Parse a decimal token amount
pub fn parse_amount(s: &str) -> Result<u128> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::input("empty amount"));
    }
    if s.starts_with('-') {
        return Err(Error::input(format!("negative amount {s:?}")));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::input(format!("amount {s:?} is not a decimal integer")));
    }
    s.parse::<u128>()
        .map_err(|_| Error::input(format!("amount {s} overflows 128 bits")))
}

/// Amounts travel as decimal strings in JSON and as integers in bincode.
pub(crate) mod amount_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&amount.to_string())
        } else {
            serializer.serialize_u128(*amount)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            super::parse_amount(&s).map_err(de::Error::custom)
        } else {
            u128::deserialize(deserializer)
        }
    }
}
