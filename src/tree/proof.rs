//! Merkle inclusion proofs

use crate::model::Hash;
use serde::{Deserialize, Serialize};

/// Sibling hashes on the path from a leaf to the root, leaf side first
///
/// Because siblings are combined in sorted order, a proof carries no
/// left/right flags: the hashes alone are enough to recompute the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(Vec<Hash>);

impl Proof {
    pub fn new(siblings: Vec<Hash>) -> Self {
        Proof(siblings)
    }

    pub fn siblings(&self) -> &[Hash] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Hash> {
        self.0
    }

    /// Root implied by this proof for the given leaf
    pub fn compute_root(&self, leaf: &Hash) -> Hash {
        process_proof(leaf, &self.0)
    }

    /// Check that `leaf` is committed under `root`
    pub fn verify(&self, root: &Hash, leaf: &Hash) -> bool {
        verify(root, leaf, &self.0)
    }

    /// Hex strings, as handed out to claimants
    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(Hash::to_hex).collect()
    }
}

impl From<Vec<Hash>> for Proof {
    fn from(siblings: Vec<Hash>) -> Self {
        Proof(siblings)
    }
}

/// Fold `proof` over `leaf` with the sorted-pair combine rule
pub fn process_proof(leaf: &Hash, proof: &[Hash]) -> Hash {
    proof
        .iter()
        .fold(*leaf, |acc, sibling| Hash::combine_sorted(&acc, sibling))
}

/// `true` iff folding `proof` over `leaf` yields `root`
pub fn verify(root: &Hash, leaf: &Hash, proof: &[Hash]) -> bool {
    process_proof(leaf, proof) == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_proof_is_identity() {
        let leaf = Hash::digest(b"only");
        assert!(verify(&leaf, &leaf, &[]));
        assert!(!verify(&Hash::digest(b"other"), &leaf, &[]));
    }

    #[test]
    fn test_single_step() {
        let a = Hash::digest(b"a");
        let b = Hash::digest(b"b");
        let root = Hash::combine_sorted(&a, &b);
        assert!(verify(&root, &a, &[b]));
        assert!(verify(&root, &b, &[a]));
    }

    #[test]
    fn test_extended_proof_fails() {
        let a = Hash::digest(b"a");
        let b = Hash::digest(b"b");
        let root = Hash::combine_sorted(&a, &b);
        assert!(!verify(&root, &a, &[b, Hash::digest(b"extra")]));
    }

    #[test]
    fn test_proof_serializes_as_hex_list() {
        let proof = Proof::new(vec![Hash::digest(b"x")]);
        let json = serde_json::to_value(&proof).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0], proof.siblings()[0].to_hex());
    }
}
