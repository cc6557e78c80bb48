//! Per-address proof artifact handed out to claimants

use super::write_atomic;
use crate::model::Address;
use crate::tree::{MerkleTree, Proof};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Address → proof, serialized as `{ "0x…": ["0x…", …] }`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofArtifact {
    proofs: BTreeMap<Address, Proof>,
}

impl ProofArtifact {
    /// Generate proofs for every leaf of `tree`
    pub fn from_tree(tree: &MerkleTree) -> Self {
        ProofArtifact {
            proofs: tree.proofs(),
        }
    }

    pub fn get(&self, address: &Address) -> Option<&Proof> {
        self.proofs.get(address)
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Proof)> {
        self.proofs.iter()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| Error::Serialization(format!("corrupted proofs JSON: {e}")))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomic(path.as_ref(), &self.to_json()?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Allocation;

    #[test]
    fn test_proofs_json_shape() {
        let a = Allocation::new(Address::from_bytes([0xaa; 20]), 500);
        let b = Allocation::new(Address::from_bytes([0xbb; 20]), 300);
        let tree = MerkleTree::build(vec![a, b]).unwrap();
        let artifact = ProofArtifact::from_tree(&tree);

        let value: serde_json::Value = serde_json::from_slice(&artifact.to_json().unwrap()).unwrap();
        let proof = value[a.address.to_hex()].as_array().unwrap();
        assert_eq!(proof.len(), 1);
        assert_eq!(proof[0], b.leaf_hash().to_hex());

        let back = ProofArtifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn test_corrupted_proofs_rejected() {
        let result = ProofArtifact::from_json(br#"{"0x12": ["0x00"]}"#);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
