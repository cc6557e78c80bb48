//! Persisted tree artifact and its validation

use crate::model::{amount_serde, Address, Allocation, Hash, LEAF_ENCODING};
use crate::tree::{build_levels, MerkleTree};
use crate::{Error, Result, FORMAT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One leaf as stored: the allocation plus its bottom-level position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafEntry {
    pub address: Address,
    #[serde(with = "amount_serde")]
    pub amount: u128,
    pub tree_index: usize,
}

impl LeafEntry {
    pub fn allocation(&self) -> Allocation {
        Allocation::new(self.address, self.amount)
    }
}

/// Serializable form of a [`MerkleTree`]
///
/// ```text
/// format        - "merkle-airdrop-v1"
/// leaf_encoding - "abi(address,uint256)/keccak256x2"
/// leaves        - allocations in insertion order with their tree_index
/// node_hashes   - every node, bottom level first, root last
/// root          - tree root
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub format: String,
    pub leaf_encoding: String,
    pub leaves: Vec<LeafEntry>,
    pub node_hashes: Vec<Hash>,
    pub root: Hash,
}

impl TreeArtifact {
    /// Snapshot a built tree
    pub fn from_tree(tree: &MerkleTree) -> Self {
        let leaves = tree
            .allocations()
            .iter()
            .zip(tree.tree_indices())
            .map(|(allocation, &tree_index)| LeafEntry {
                address: allocation.address,
                amount: allocation.amount,
                tree_index,
            })
            .collect();

        TreeArtifact {
            format: FORMAT.to_string(),
            leaf_encoding: LEAF_ENCODING.to_string(),
            leaves,
            node_hashes: tree.node_hashes().copied().collect(),
            root: tree.root(),
        }
    }

    /// Validate and rebuild the tree
    ///
    /// Every leaf hash and internal node is recomputed and compared against
    /// the stored values; nothing is returned unless all of them match.
    pub fn into_tree(self) -> Result<MerkleTree> {
        if self.format != FORMAT {
            return Err(Error::Serialization(format!(
                "unknown tree format {:?}, expected {:?}",
                self.format, FORMAT
            )));
        }
        if self.leaf_encoding != LEAF_ENCODING {
            return Err(Error::Serialization(format!(
                "unsupported leaf encoding {:?}",
                self.leaf_encoding
            )));
        }
        if self.leaves.is_empty() {
            return Err(Error::Serialization("tree has no leaves".into()));
        }

        let n = self.leaves.len();
        let mut bottom = vec![Hash::ZERO; n];
        let mut seen_positions = vec![false; n];
        let mut seen_addresses = HashSet::with_capacity(n);

        for entry in &self.leaves {
            let position = entry.tree_index;
            if position >= n || seen_positions[position] {
                return Err(Error::Serialization(format!(
                    "invalid tree_index {position} for {}",
                    entry.address
                )));
            }
            if entry.address.is_zero() || entry.amount == 0 {
                return Err(Error::Serialization(format!(
                    "leaf {} commits a zero address or zero amount",
                    entry.address
                )));
            }
            if !seen_addresses.insert(entry.address) {
                return Err(Error::Serialization(format!(
                    "duplicate address {}",
                    entry.address
                )));
            }
            seen_positions[position] = true;
            bottom[position] = entry.allocation().leaf_hash();
        }

        if bottom.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::Serialization("leaves are not in sorted order".into()));
        }

        let levels = build_levels(bottom);
        let recomputed = levels.iter().flatten();
        if levels.iter().map(Vec::len).sum::<usize>() != self.node_hashes.len()
            || !recomputed.eq(self.node_hashes.iter())
        {
            return Err(Error::Serialization(
                "node hashes do not match leaves".into(),
            ));
        }

        let root = levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::ZERO);
        if root != self.root {
            return Err(Error::Serialization(format!(
                "root mismatch: stored {}, computed {}",
                self.root, root
            )));
        }

        let (allocations, tree_index) = self
            .leaves
            .into_iter()
            .map(|entry| (entry.allocation(), entry.tree_index))
            .unzip();
        Ok(MerkleTree::from_parts(allocations, tree_index, levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(n: u8) -> MerkleTree {
        let allocations = (1..=n)
            .map(|i| Allocation::new(Address::from_bytes([i; 20]), u128::from(i) * 7))
            .collect();
        MerkleTree::build(allocations).unwrap()
    }

    #[test]
    fn test_artifact_roundtrip_preserves_proofs() {
        let original = tree(9);
        let restored = TreeArtifact::from_tree(&original).into_tree().unwrap();

        assert_eq!(restored.root(), original.root());
        for i in 0..original.len() {
            assert_eq!(restored.proof(i), original.proof(i));
            assert_eq!(restored.allocation(i), original.allocation(i));
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(3));
        artifact.format = "merkle-airdrop-v0".into();
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_wrong_encoding_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(3));
        artifact.leaf_encoding = "sha256".into();
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_tampered_amount_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(4));
        artifact.leaves[1].amount += 1;
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_tampered_node_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(5));
        let middle = artifact.node_hashes.len() / 2;
        artifact.node_hashes[middle] = Hash::digest(b"forged");
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_truncated_nodes_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(5));
        artifact.node_hashes.pop();
        assert!(artifact.into_tree().is_err());
    }

    #[test]
    fn test_root_mismatch_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(2));
        artifact.root = Hash::digest(b"not the root");
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_zero_amount_leaf_rejected() {
        // Hashes stay consistent, so only the leaf check can catch it
        let mut artifact = TreeArtifact::from_tree(&tree(3));
        artifact.leaves[2].amount = 0;
        let mut sorted: Vec<(Hash, usize)> = artifact
            .leaves
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.allocation().leaf_hash(), i))
            .collect();
        sorted.sort();
        for (position, &(_, i)) in sorted.iter().enumerate() {
            artifact.leaves[i].tree_index = position;
        }
        let levels = build_levels(sorted.into_iter().map(|(hash, _)| hash).collect());
        artifact.node_hashes = levels.iter().flatten().copied().collect();
        artifact.root = levels[levels.len() - 1][0];

        let err = artifact.into_tree().unwrap_err();
        assert!(matches!(err, Error::Serialization(ref m) if m.contains("zero")));
    }

    #[test]
    fn test_zero_address_leaf_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(2));
        artifact.leaves[0].address = Address::ZERO;
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_bad_tree_index_rejected() {
        let mut artifact = TreeArtifact::from_tree(&tree(3));
        artifact.leaves[0].tree_index = artifact.leaves[1].tree_index;
        assert!(matches!(artifact.into_tree(), Err(Error::Serialization(_))));
    }
}
