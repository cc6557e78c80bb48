//! Batch job: allocation rows in, tree and proof artifacts out
//!
//! Nothing is written unless every row parsed, the tree built and both
//! artifacts encoded. Both files are staged beside their destinations, the
//! staged tree is read back and its root compared against the freshly built
//! one, and only then are they renamed into place.

use crate::config::BuildConfig;
use crate::model::{Allocation, Hash};
use crate::store::{ProofArtifact, StagedFile, TreeStore};
use crate::tree::MerkleTree;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::info;

/// Summary of a finished batch run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildReport {
    pub root: Hash,
    pub leaves: usize,
    pub height: usize,
    pub total_amount: u128,
}

/// Parse `address,amount` rows
///
/// Blank lines and `#` comments are skipped, and a leading
/// `address,amount` header is ignored. Errors carry the 1-based line.
pub fn read_allocations(mut reader: impl BufRead) -> Result<Vec<Allocation>> {
    let mut allocations = Vec::new();
    let mut buf = Vec::new();
    let mut line_num = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_num += 1;
        let line = std::str::from_utf8(&buf).map_err(|e| Error::Input {
            line: line_num,
            message: format!("row is not valid UTF-8: {e}"),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if allocations.is_empty() && is_header(&fields) {
            continue;
        }
        if fields.len() != 2 {
            return Err(Error::Input {
                line: line_num,
                message: format!("expected 'address,amount', got {trimmed:?}"),
            });
        }

        let allocation =
            Allocation::parse(fields[0], fields[1]).map_err(|e| e.at_line(line_num))?;
        allocations.push(allocation);
    }

    Ok(allocations)
}

fn is_header(fields: &[&str]) -> bool {
    matches!(fields, [a, b] if a.eq_ignore_ascii_case("address") && b.eq_ignore_ascii_case("amount"))
}

/// Build a tree from allocation rows
pub fn build_tree(reader: impl BufRead) -> Result<MerkleTree> {
    MerkleTree::build(read_allocations(reader)?)
}

/// Run the whole job described by `config`
pub fn run(config: &BuildConfig) -> Result<BuildReport> {
    info!(input = %config.input.display(), "Reading allocations");
    let file = File::open(&config.input)?;
    let tree = build_tree(BufReader::new(file))?;

    let total_amount = tree
        .allocations()
        .iter()
        .try_fold(0u128, |sum, a| sum.checked_add(a.amount))
        .ok_or_else(|| Error::input("total allocation overflows 128 bits"))?;

    // Encode both artifacts before touching the filesystem
    let tree_bytes = TreeStore::dump(&tree, config.tree_format())?;
    let proofs = ProofArtifact::from_tree(&tree);
    let proof_bytes = proofs.to_json()?;

    // Stage both files and check the tree reads back before either lands
    let staged_tree = StagedFile::write(&config.tree_output, &tree_bytes)?;
    let staged_proofs = StagedFile::write(&config.proofs_output, &proof_bytes)?;

    let reloaded = TreeStore::open(staged_tree.path())?;
    if reloaded.root() != tree.root() {
        return Err(Error::Serialization(format!(
            "stored root {} differs from built root {}",
            reloaded.root(),
            tree.root()
        )));
    }

    staged_proofs.commit()?;
    staged_tree.commit()?;
    info!(
        tree = %config.tree_output.display(),
        proofs = %config.proofs_output.display(),
        "Wrote artifacts"
    );

    info!(root = %tree.root(), leaves = tree.len(), "Proofs saved successfully");
    Ok(BuildReport {
        root: tree.root(),
        leaves: tree.len(),
        height: tree.height(),
        total_amount,
    })
}
