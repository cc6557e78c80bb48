//! Merkle tree construction and proofs for allocation sets
//!
//! - Leaves are double-hashed `(address, amount)` encodings
//! - Sibling nodes are combined in sorted byte order, so proofs are plain
//!   lists of hashes without position flags
//! - The root is the only value a verifier needs to keep

mod merkle;
mod proof;

pub use merkle::MerkleTree;
pub(crate) use merkle::build_levels;
pub use proof::{process_proof, verify, Proof};
