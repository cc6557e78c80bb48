//! Durable tree and proof artifacts
//!
//! A stored tree reproduces the same root and the same proof for every leaf
//! index long after the build process has exited. Loading validates the whole
//! artifact before a [`MerkleTree`] is handed back.

mod artifact;
mod codec;
mod proofs;

pub use artifact::{LeafEntry, TreeArtifact};
pub use codec::ArtifactFormat;
pub use proofs::ProofArtifact;

use crate::tree::MerkleTree;
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dump/load entry points for tree artifacts
pub struct TreeStore;

impl TreeStore {
    /// Serialize a tree
    pub fn dump(tree: &MerkleTree, format: ArtifactFormat) -> Result<Vec<u8>> {
        codec::encode(&TreeArtifact::from_tree(tree), format)
    }

    /// Deserialize and validate a tree, detecting the encoding
    pub fn load(data: &[u8]) -> Result<MerkleTree> {
        codec::decode(data)?.into_tree()
    }

    /// Write a tree to `path` atomically
    pub fn save(tree: &MerkleTree, path: impl AsRef<Path>, format: ArtifactFormat) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, &Self::dump(tree, format)?)?;
        debug!(path = %path.display(), ?format, "Wrote tree artifact");
        Ok(())
    }

    /// Read a tree from `path`
    pub fn open(path: impl AsRef<Path>) -> Result<MerkleTree> {
        Self::load(&std::fs::read(path)?)
    }
}

/// Write to a temp sibling and rename into place
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    StagedFile::write(path, contents)?.commit()
}

/// A file written next to its destination and renamed over it on commit
///
/// Dropping an uncommitted file removes the temp sibling, so a batch that
/// stages several outputs leaves nothing behind when any step fails.
pub(crate) struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub(crate) fn write(path: &Path, contents: &[u8]) -> Result<Self> {
        let staged = StagedFile {
            temp: temp_path(path),
            target: path.to_path_buf(),
            committed: false,
        };
        let mut file = File::create(&staged.temp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(staged)
    }

    /// Where the contents currently live
    pub(crate) fn path(&self) -> &Path {
        &self.temp
    }

    pub(crate) fn commit(mut self) -> Result<()> {
        std::fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.temp);
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Allocation};
    use crate::Error;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn tree(amounts: &[u128]) -> MerkleTree {
        let allocations = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| {
                let mut bytes = [0u8; 20];
                bytes[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
                Allocation::new(Address::from_bytes(bytes), amount)
            })
            .collect();
        MerkleTree::build(allocations).unwrap()
    }

    #[test]
    fn test_save_and_open_both_formats() {
        let dir = tempdir().unwrap();
        let original = tree(&[5, 10, 15, 20, 25]);

        for (name, format) in [("tree.json", ArtifactFormat::Json), ("tree.bin", ArtifactFormat::Binary)] {
            let path = dir.path().join(name);
            TreeStore::save(&original, &path, format).unwrap();
            assert!(!dir.path().join(format!("{name}.tmp")).exists());

            let loaded = TreeStore::open(&path).unwrap();
            assert_eq!(loaded.root(), original.root());
        }
    }

    #[test]
    fn test_dropped_staged_file_leaves_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("tree.json");
        {
            let staged = StagedFile::write(&target, b"{}").unwrap();
            assert!(staged.path().exists());
        }
        assert!(!target.exists());
        assert!(!dir.path().join("tree.json.tmp").exists());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            TreeStore::open(dir.path().join("absent.json")),
            Err(Error::Io(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_dump_load_preserves_root_and_proofs(
            amounts in prop::collection::vec(1u128..u128::MAX, 1..48),
            binary in any::<bool>(),
        ) {
            let original = tree(&amounts);
            let format = if binary { ArtifactFormat::Binary } else { ArtifactFormat::Json };
            let loaded = TreeStore::load(&TreeStore::dump(&original, format).unwrap()).unwrap();

            prop_assert_eq!(loaded.root(), original.root());
            for i in 0..original.len() {
                prop_assert_eq!(loaded.proof(i), original.proof(i));
            }
        }
    }
}
