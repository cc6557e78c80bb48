//! On-chain claim state machine
//!
//! The airdrop keeps only the current root. Claimants supply the proof for
//! their `(address, amount)` leaf; the airdrop checks eligibility and claim
//! history, verifies the proof and pays out from its reserve.

mod airdrop;
mod claims;
mod memory;
mod traits;

pub use airdrop::{Airdrop, AirdropConfig, AirdropEvent};
pub use claims::ClaimRegistry;
pub use memory::{MemoryCollection, MemoryToken};
pub use traits::{Eligibility, TokenLedger};
