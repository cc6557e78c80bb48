//! In-memory token and collection ledgers

use super::{Eligibility, TokenLedger};
use crate::model::Address;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// A minimal fungible token ledger
#[derive(Clone, Debug)]
pub struct MemoryToken {
    address: Address,
    balances: BTreeMap<Address, u128>,
}

impl MemoryToken {
    pub fn new(address: Address) -> Self {
        MemoryToken {
            address,
            balances: BTreeMap::new(),
        }
    }

    /// Credit `amount` to `to` out of thin air
    pub fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        if to.is_zero() {
            return Err(Error::ZeroAddress);
        }
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| Error::Transfer(format!("mint overflows balance of {to}")))?;
        Ok(())
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().sum()
    }
}

impl TokenLedger for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        if to.is_zero() {
            return Err(Error::Transfer("transfer to the zero address".into()));
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(Error::Transfer(format!(
                "{from} holds {available}, cannot send {amount}"
            )));
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| Error::Transfer(format!("balance overflow for {to}")))?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

/// A collection where each account holds some number of items
#[derive(Clone, Debug)]
pub struct MemoryCollection {
    address: Address,
    holdings: BTreeMap<Address, u64>,
}

impl MemoryCollection {
    pub fn new(address: Address) -> Self {
        MemoryCollection {
            address,
            holdings: BTreeMap::new(),
        }
    }

    /// Give `owner` one more item
    pub fn mint(&mut self, owner: Address) {
        *self.holdings.entry(owner).or_insert(0) += 1;
    }

    /// Take every item away from `owner`
    pub fn burn_all(&mut self, owner: &Address) {
        self.holdings.remove(owner);
    }
}

impl Eligibility for MemoryCollection {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.holdings.get(owner).copied().unwrap_or(0)
    }
}
