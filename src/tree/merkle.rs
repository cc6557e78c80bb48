//! Merkle tree over allocation leaves

use super::proof::Proof;
use crate::model::{Address, Allocation, Hash};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// A fully built Merkle tree over a set of allocations
///
/// Leaf hashes are sorted before the bottom level is laid out, so the root
/// depends only on the set of leaves. Each allocation keeps its insertion
/// index (the addressing key for proofs) and remembers where its leaf landed
/// in the bottom level.
///
/// Levels are combined pairwise with [`Hash::combine_sorted`]; an unpaired
/// last node is promoted to the next level unchanged.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Allocations in insertion order
    allocations: Vec<Allocation>,
    /// Bottom-level position of each allocation's leaf
    tree_index: Vec<usize>,
    /// All levels, sorted leaves at index 0 and the root alone at the top
    levels: Vec<Vec<Hash>>,
    /// Address → insertion index
    by_address: HashMap<Address, usize>,
}

impl MerkleTree {
    /// Build a tree from allocations
    ///
    /// Fails on an empty set, a repeated address, the zero address or a
    /// zero amount.
    pub fn build(allocations: Vec<Allocation>) -> Result<Self> {
        if allocations.is_empty() {
            return Err(Error::input("no allocations to commit"));
        }

        let mut by_address = HashMap::with_capacity(allocations.len());
        for (i, allocation) in allocations.iter().enumerate() {
            if allocation.address.is_zero() {
                return Err(Error::input(format!("zero address in entry {}", i + 1)));
            }
            if allocation.amount == 0 {
                return Err(Error::input(format!(
                    "zero amount for {} (entry {})",
                    allocation.address,
                    i + 1
                )));
            }
            if let Some(first) = by_address.insert(allocation.address, i) {
                return Err(Error::input(format!(
                    "duplicate address {} (entries {} and {})",
                    allocation.address,
                    first + 1,
                    i + 1
                )));
            }
        }

        let hashes: Vec<Hash> = allocations.iter().map(Allocation::leaf_hash).collect();
        let (leaves, tree_index) = sort_leaves(&hashes);
        let levels = build_levels(leaves);

        let tree = MerkleTree {
            allocations,
            tree_index,
            levels,
            by_address,
        };
        info!(
            leaves = tree.len(),
            height = tree.height(),
            root = %tree.root(),
            "Built merkle tree"
        );
        Ok(tree)
    }

    /// Assemble a tree from already-validated parts
    pub(crate) fn from_parts(
        allocations: Vec<Allocation>,
        tree_index: Vec<usize>,
        levels: Vec<Vec<Hash>>,
    ) -> Self {
        let by_address = allocations
            .iter()
            .enumerate()
            .map(|(i, a)| (a.address, i))
            .collect();
        MerkleTree {
            allocations,
            tree_index,
            levels,
            by_address,
        }
    }

    /// Root of the tree
    pub fn root(&self) -> Hash {
        // build() rejects empty input, so the top level always has one node
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::ZERO)
    }

    /// Root for an arbitrary collection of leaf hashes, `None` if empty
    pub fn root_of(leaves: &[Hash]) -> Option<Hash> {
        if leaves.is_empty() {
            return None;
        }
        let (sorted, _) = sort_leaves(leaves);
        build_levels(sorted).last().and_then(|l| l.first()).copied()
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Number of levels above the leaves
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn allocation(&self, index: usize) -> Option<&Allocation> {
        self.allocations.get(index)
    }

    /// Bottom-level position of the leaf for insertion index `index`
    pub fn tree_index(&self, index: usize) -> Option<usize> {
        self.tree_index.get(index).copied()
    }

    pub(crate) fn tree_indices(&self) -> &[usize] {
        &self.tree_index
    }

    /// Leaf hash for insertion index `index`
    pub fn leaf_hash(&self, index: usize) -> Option<Hash> {
        let position = self.tree_index(index)?;
        self.levels.first()?.get(position).copied()
    }

    /// All levels, leaves first
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// Every node hash in level order, leaves first and root last
    pub fn node_hashes(&self) -> impl Iterator<Item = &Hash> {
        self.levels.iter().flatten()
    }

    /// Insertion index of `address`
    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.by_address.get(address).copied()
    }

    /// Proof for the allocation at insertion index `index`
    ///
    /// Walks from the leaf to just below the root collecting the node each
    /// step is paired with. Promoted steps contribute nothing.
    pub fn proof(&self, index: usize) -> Option<Proof> {
        let mut position = self.tree_index(index)?;
        let mut siblings = Vec::with_capacity(self.height());

        for level in &self.levels[..self.height()] {
            let sibling = position ^ 1;
            if sibling < level.len() {
                siblings.push(level[sibling]);
            }
            position /= 2;
        }

        Some(Proof::new(siblings))
    }

    /// Proof for `address`, if it is part of the tree
    pub fn proof_for(&self, address: &Address) -> Option<Proof> {
        self.index_of(address).and_then(|i| self.proof(i))
    }

    /// Proofs for every allocation, keyed by address
    pub fn proofs(&self) -> BTreeMap<Address, Proof> {
        self.allocations
            .iter()
            .enumerate()
            .filter_map(|(i, a)| self.proof(i).map(|p| (a.address, p)))
            .collect()
    }

    /// Check a proof against this tree's root
    pub fn verify(&self, allocation: &Allocation, proof: &Proof) -> bool {
        proof.verify(&self.root(), &allocation.leaf_hash())
    }
}

/// Sort leaf hashes ascending; returns the sorted level and, for every input
/// position, where it ended up.
fn sort_leaves(hashes: &[Hash]) -> (Vec<Hash>, Vec<usize>) {
    let mut order: Vec<usize> = (0..hashes.len()).collect();
    order.sort_by(|&a, &b| hashes[a].cmp(&hashes[b]).then(a.cmp(&b)));

    let mut tree_index = vec![0; hashes.len()];
    for (position, &original) in order.iter().enumerate() {
        tree_index[original] = position;
    }
    let sorted = order.iter().map(|&i| hashes[i]).collect();
    (sorted, tree_index)
}

/// Build every level above `leaves`
pub(crate) fn build_levels(leaves: Vec<Hash>) -> Vec<Vec<Hash>> {
    let mut levels = vec![leaves];

    while levels.last().is_some_and(|level| level.len() > 1) {
        let current = &levels[levels.len() - 1];
        let next = next_level(current);
        debug!(
            level = levels.len(),
            nodes = next.len(),
            "Combined tree level"
        );
        levels.push(next);
    }

    levels
}

/// Combine one level into its parent level
fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => Hash::combine_sorted(left, right),
            [single] => *single,
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::verify;
    use proptest::prelude::*;

    fn alloc(byte: u8, amount: u128) -> Allocation {
        Allocation::new(Address::from_bytes([byte; 20]), amount)
    }

    fn allocations(n: usize) -> Vec<Allocation> {
        (1..=n).map(|i| alloc(i as u8, i as u128 * 100)).collect()
    }

    #[test]
    fn test_zero_address_or_amount_rejected() {
        assert!(matches!(
            MerkleTree::build(vec![alloc(1, 10), Allocation::new(Address::ZERO, 5)]),
            Err(Error::Input { .. })
        ));
        assert!(matches!(
            MerkleTree::build(vec![alloc(1, 10), alloc(2, 0)]),
            Err(Error::Input { .. })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            MerkleTree::build(vec![]),
            Err(Error::Input { .. })
        ));
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let result = MerkleTree::build(vec![alloc(1, 10), alloc(2, 20), alloc(1, 30)]);
        assert!(matches!(result, Err(Error::Input { .. })));
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let tree = MerkleTree::build(vec![alloc(1, 10)]).unwrap();
        assert_eq!(tree.root(), alloc(1, 10).leaf_hash());
        assert_eq!(tree.height(), 0);
        assert!(tree.proof(0).unwrap().is_empty());
    }

    #[test]
    fn test_two_leaf_scenario() {
        let a = Allocation::parse("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "500").unwrap();
        let b = Allocation::parse("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "300").unwrap();
        let tree = MerkleTree::build(vec![a, b]).unwrap();
        let root = tree.root();

        let proof = tree.proof_for(&a.address).unwrap();
        assert_eq!(proof.siblings(), &[b.leaf_hash()]);
        assert!(verify(&root, &a.leaf_hash(), &[b.leaf_hash()]));

        let wrong = Allocation::new(a.address, 501);
        assert!(!verify(&root, &wrong.leaf_hash(), &[b.leaf_hash()]));
    }

    #[test]
    fn test_every_proof_verifies() {
        for n in 1..=17 {
            let tree = MerkleTree::build(allocations(n)).unwrap();
            let root = tree.root();
            for (i, a) in tree.allocations().iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(proof.verify(&root, &a.leaf_hash()), "n={n} i={i}");
                assert!(proof.len() <= tree.height());
            }
        }
    }

    #[test]
    fn test_odd_level_promotes_last_node() {
        let tree = MerkleTree::build(allocations(3)).unwrap();
        let levels = tree.levels();
        assert_eq!(levels.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(levels[1][1], levels[0][2]);

        // The promoted leaf's proof skips the level where it had no partner
        let promoted = (0..3).find(|&i| tree.tree_index(i) == Some(2)).unwrap();
        assert_eq!(tree.proof(promoted).unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_leaf_fails() {
        let tree = MerkleTree::build(allocations(8)).unwrap();
        let proof = tree.proof(0).unwrap();
        let other = tree.allocation(1).unwrap();
        assert!(!tree.verify(other, &proof));
    }

    #[test]
    fn test_truncated_proof_fails() {
        let tree = MerkleTree::build(allocations(8)).unwrap();
        let a = tree.allocation(3).unwrap();
        let mut siblings = tree.proof(3).unwrap().into_inner();
        siblings.pop();
        assert!(!tree.verify(a, &Proof::new(siblings)));
    }

    #[test]
    fn test_out_of_range_index() {
        let tree = MerkleTree::build(allocations(4)).unwrap();
        assert!(tree.proof(4).is_none());
        assert!(tree.proof_for(&Address::from_bytes([99; 20])).is_none());
    }

    #[test]
    fn test_node_hash_count() {
        let tree = MerkleTree::build(allocations(5)).unwrap();
        // 5 + 3 + 2 + 1
        assert_eq!(tree.node_hashes().count(), 11);
        assert_eq!(tree.node_hashes().last(), Some(&tree.root()));
    }

    #[test]
    fn test_proofs_keyed_by_address() {
        let tree = MerkleTree::build(allocations(6)).unwrap();
        let proofs = tree.proofs();
        assert_eq!(proofs.len(), 6);
        for a in tree.allocations() {
            assert!(proofs[&a.address].verify(&tree.root(), &a.leaf_hash()));
        }
    }

    #[test]
    fn test_different_amount_changes_root() {
        let mut set = allocations(4);
        let root = MerkleTree::build(set.clone()).unwrap().root();
        set[2].amount += 1;
        assert_ne!(MerkleTree::build(set).unwrap().root(), root);
    }

    proptest! {
        #[test]
        fn prop_root_independent_of_order(n in 1usize..40, seed in any::<u64>()) {
            let original = allocations(n);
            let mut shuffled = original.clone();
            // Deterministic Fisher-Yates driven by the seed
            let mut state = seed | 1;
            for i in (1..shuffled.len()).rev() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                shuffled.swap(i, (state % (i as u64 + 1)) as usize);
            }

            let a = MerkleTree::build(original.clone()).unwrap();
            let b = MerkleTree::build(shuffled).unwrap();
            prop_assert_eq!(a.root(), b.root());

            let hashes: Vec<Hash> = original.iter().map(Allocation::leaf_hash).collect();
            prop_assert_eq!(MerkleTree::root_of(&hashes), Some(a.root()));
        }

        #[test]
        fn prop_bit_flip_breaks_proof(n in 2usize..40, pick in any::<usize>(), bit in 0usize..256) {
            let tree = MerkleTree::build(allocations(n)).unwrap();
            let index = pick % n;
            let leaf = tree.leaf_hash(index).unwrap();
            let siblings = tree.proof(index).unwrap().into_inner();
            prop_assume!(!siblings.is_empty());

            for element in 0..siblings.len() {
                let mut tampered = siblings.clone();
                tampered[element] = tampered[element].with_bit_flipped(bit);
                prop_assert!(!verify(&tree.root(), &leaf, &tampered));
            }
        }
    }
}
