//! Per-address claim record

use crate::model::Address;
use std::collections::BTreeSet;

/// Addresses that have claimed
///
/// Keyed by address alone, not by root: a claim made under one root still
/// counts after the root is replaced. Entries are never removed.
#[derive(Clone, Debug, Default)]
pub struct ClaimRegistry {
    claimed: BTreeSet<Address>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, address: &Address) -> bool {
        self.claimed.contains(address)
    }

    /// Number of addresses that have claimed
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.claimed.iter()
    }

    /// Unclaimed → Claimed. Returns false if it already was.
    pub(super) fn mark(&mut self, address: Address) -> bool {
        self.claimed.insert(address)
    }
}
