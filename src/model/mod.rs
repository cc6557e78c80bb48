//! Core value types: hashes, addresses and allocations

mod address;
mod allocation;
mod hash;

pub(crate) use allocation::amount_serde;
pub use address::Address;
pub use allocation::{encode, leaf_hash, parse_amount, Allocation, LEAF_ENCODING};
pub use hash::Hash;
