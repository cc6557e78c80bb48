//! Batch build configuration
//!
//! Read from a JSON file (every field optional):
//! ```json
//! { "input": "addresses.csv", "tree_output": "tree.json",
//!   "proofs_output": "proofs.json", "binary": false }
//! ```
//! Command-line flags override whatever the file sets.

use crate::store::ArtifactFormat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the batch job reads allocations and writes artifacts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Allocation rows (`address,amount`)
    pub input: PathBuf,
    /// Tree artifact destination
    pub tree_output: PathBuf,
    /// Proof artifact destination
    pub proofs_output: PathBuf,
    /// Write the tree in the compressed binary encoding instead of JSON
    pub binary: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            input: PathBuf::from("addresses.csv"),
            tree_output: PathBuf::from("tree.json"),
            proofs_output: PathBuf::from("proofs.json"),
            binary: false,
        }
    }
}

impl BuildConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load from `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn tree_format(&self) -> ArtifactFormat {
        if self.binary {
            ArtifactFormat::Binary
        } else {
            ArtifactFormat::Json
        }
    }
}
