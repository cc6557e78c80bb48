//! # merkle_airdrop
//!
//! Distribute a fixed token allocation to a pre-committed set of
//! `(address, amount)` pairs while keeping only a 32-byte Merkle root on the
//! verifying ledger.
//!
//! ## Core Concepts
//!
//! - **Leaves**: `keccak256(keccak256(abi.encode(address, amount)))`
//! - **Tree**: sorted leaves, sibling pairs hashed in ascending byte order,
//!   odd nodes promoted unchanged
//! - **Artifacts**: a versioned tree dump and a per-address proof file,
//!   written only when the whole batch succeeds
//! - **Airdrop**: the claim state machine that verifies proofs, gates on
//!   eligibility, records claims and lets the owner rotate the root
//!
//! ## Example
//!
//! ```ignore
//! use merkle_airdrop::{Airdrop, Allocation, MerkleTree};
//!
//! let tree = MerkleTree::build(allocations)?;
//! let mut airdrop = Airdrop::deploy(address, owner, token, nft, tree.root())?;
//! let proof = tree.proof_for(&claimant).unwrap();
//! airdrop.claim(claimant, amount, proof.siblings())?;
//! ```

pub mod batch;
pub mod chain;
pub mod config;
pub mod model;
pub mod store;
pub mod tree;

mod error;

pub use batch::BuildReport;
pub use chain::{
    Airdrop, AirdropConfig, AirdropEvent, ClaimRegistry, Eligibility, MemoryCollection,
    MemoryToken, TokenLedger,
};
pub use config::BuildConfig;
pub use error::{Error, Result};
pub use model::{leaf_hash, Address, Allocation, Hash, LEAF_ENCODING};
pub use store::{ArtifactFormat, ProofArtifact, TreeArtifact, TreeStore};
pub use tree::{verify, MerkleTree, Proof};

/// Binary artifact version for format compatibility
pub const VERSION: u32 = 1;

/// Magic bytes opening a binary tree artifact
pub const MAGIC: &[u8; 8] = b"AIRDROPT";

/// Format tag carried inside every tree artifact
pub const FORMAT: &str = "merkle-airdrop-v1";
