//! Collaborator interfaces consumed by the airdrop
//!
//! Both are queried inside the same call as the state change they guard, so
//! the values they return are the ones the transition acts on.

use crate::model::Address;
use crate::Result;

/// Fungible token the airdrop pays out from
///
/// Implementations can be:
/// - An in-memory ledger for hosts and tests
/// - An adapter over a real token contract
pub trait TokenLedger {
    /// Address of the token contract
    fn address(&self) -> Address;

    /// Balance held by `owner`
    fn balance_of(&self, owner: &Address) -> u128;

    /// Move `amount` from `from` to `to`
    ///
    /// Must either apply fully or return an error with balances untouched.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()>;
}

/// Ownership query deciding who may claim at all
pub trait Eligibility {
    /// Address of the collection contract
    fn address(&self) -> Address;

    /// Number of items `owner` holds
    fn balance_of(&self, owner: &Address) -> u64;

    /// Holding at least one item makes an account eligible
    fn is_eligible(&self, account: &Address) -> bool {
        self.balance_of(account) > 0
    }
}
