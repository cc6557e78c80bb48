//! Claim verification and root management
//!
//! Each public entrypoint is one transaction: it either applies every effect
//! or returns an error having changed nothing.

use super::{ClaimRegistry, Eligibility, TokenLedger};
use crate::model::{leaf_hash, Address, Hash};
use crate::tree::verify;
use crate::{Error, Result};
use tracing::{info, warn};

/// Deployment-time references plus the current root
///
/// Only `root` is ever rewritten, and only by the owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirdropConfig {
    pub token: Address,
    pub eligibility: Address,
    pub root: Hash,
}

/// Notifications emitted by successful transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AirdropEvent {
    Claimed {
        claimant: Address,
        amount: u128,
    },
    RootUpdated {
        previous: Hash,
        current: Hash,
    },
    Withdrawn {
        to: Address,
        amount: u128,
    },
}

/// The on-chain airdrop
///
/// Holds its token reserve at `address` in the token ledger, pays claims
/// whose `(caller, amount)` leaf verifies against the current root, and lets
/// the owner rotate the root or recover the remaining reserve.
pub struct Airdrop<T, E> {
    address: Address,
    owner: Address,
    config: AirdropConfig,
    /// Reserve below which a new root is refused
    reserve_floor: u128,
    claims: ClaimRegistry,
    token: T,
    eligibility: E,
    events: Vec<AirdropEvent>,
}

impl<T: TokenLedger, E: Eligibility> Airdrop<T, E> {
    /// Deploy at `address`, owned by `owner`, committing to `root`
    pub fn deploy(address: Address, owner: Address, token: T, eligibility: E, root: Hash) -> Result<Self> {
        if address.is_zero() || owner.is_zero() {
            return Err(Error::ZeroAddress);
        }
        let config = AirdropConfig {
            token: token.address(),
            eligibility: eligibility.address(),
            root,
        };
        info!(%address, %owner, %root, "Deployed airdrop");
        Ok(Airdrop {
            address,
            owner,
            config,
            reserve_floor: 0,
            claims: ClaimRegistry::new(),
            token,
            eligibility,
            events: Vec::new(),
        })
    }

    /// Refuse new roots while the reserve is below `floor`
    pub fn with_reserve_floor(mut self, floor: u128) -> Self {
        self.reserve_floor = floor;
        self
    }

    // === Entrypoints ===

    /// Claim `amount` for `caller` with a proof against the current root
    ///
    /// Checks run in a fixed order so the reported reason is deterministic:
    /// zero caller, zero amount, reserve, eligibility, already claimed, proof.
    pub fn claim(&mut self, caller: Address, amount: u128, proof: &[Hash]) -> Result<()> {
        let result = self.try_claim(caller, amount, proof);
        match &result {
            Ok(()) => info!(claimant = %caller, amount, "Airdrop claimed"),
            Err(e) => warn!(claimant = %caller, amount, error = %e, "Claim rejected"),
        }
        result
    }

    fn try_claim(&mut self, caller: Address, amount: u128, proof: &[Hash]) -> Result<()> {
        if caller.is_zero() {
            return Err(Error::ZeroAddress);
        }
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        let available = self.reserve();
        if available < amount {
            return Err(Error::InsufficientContractBalance {
                available,
                required: amount,
            });
        }
        if !self.eligibility.is_eligible(&caller) {
            return Err(Error::Eligibility(caller));
        }
        if self.claims.is_claimed(&caller) {
            return Err(Error::AlreadyClaimed(caller));
        }
        if !verify(&self.config.root, &leaf_hash(&caller, amount), proof) {
            return Err(Error::ProofInvalid);
        }

        // Transfer first: if it fails nothing else has changed
        self.token.transfer(&self.address, &caller, amount)?;
        self.claims.mark(caller);
        self.events.push(AirdropEvent::Claimed {
            claimant: caller,
            amount,
        });
        Ok(())
    }

    /// Replace the trusted root (owner only)
    ///
    /// Claim records survive: an address that claimed under an earlier root
    /// stays claimed.
    pub fn update_root(&mut self, caller: Address, new_root: Hash) -> Result<()> {
        if caller != self.owner {
            return Err(Error::Unauthorized(caller));
        }
        if new_root == self.config.root {
            return Err(Error::RootUnchanged);
        }
        let available = self.reserve();
        if available == 0 || available < self.reserve_floor {
            return Err(Error::InsufficientContractBalance {
                available,
                required: self.reserve_floor.max(1),
            });
        }

        let previous = std::mem::replace(&mut self.config.root, new_root);
        self.events.push(AirdropEvent::RootUpdated {
            previous,
            current: new_root,
        });
        info!(%previous, current = %new_root, "Root updated");
        Ok(())
    }

    /// Send the whole remaining reserve to the owner (owner only)
    ///
    /// Returns the amount moved; an empty reserve moves nothing.
    pub fn withdraw(&mut self, caller: Address) -> Result<u128> {
        if caller != self.owner {
            return Err(Error::Unauthorized(caller));
        }
        let amount = self.reserve();
        if amount > 0 {
            self.token.transfer(&self.address, &self.owner, amount)?;
        }
        self.events.push(AirdropEvent::Withdrawn {
            to: self.owner,
            amount,
        });
        info!(to = %self.owner, amount, "Reserve withdrawn");
        Ok(amount)
    }

    // === Accessors ===

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn config(&self) -> &AirdropConfig {
        &self.config
    }

    pub fn token_ref(&self) -> Address {
        self.config.token
    }

    pub fn eligibility_ref(&self) -> Address {
        self.config.eligibility
    }

    pub fn root(&self) -> Hash {
        self.config.root
    }

    pub fn reserve_floor(&self) -> u128 {
        self.reserve_floor
    }

    /// Whether `address` has claimed under any root
    pub fn claimed(&self, address: &Address) -> bool {
        self.claims.is_claimed(address)
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    /// Tokens currently held by the airdrop
    pub fn reserve(&self) -> u128 {
        self.token.balance_of(&self.address)
    }

    pub fn events(&self) -> &[AirdropEvent] {
        &self.events
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    /// Mutable token access for hosts that fund or inspect the ledger
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn eligibility(&self) -> &E {
        &self.eligibility
    }

    pub fn eligibility_mut(&mut self) -> &mut E {
        &mut self.eligibility
    }
}
