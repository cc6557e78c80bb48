//! airdrop CLI - build and inspect Merkle airdrop artifacts
//!
//! Logs go to stderr (filter with `RUST_LOG`); command results are printed to
//! stdout as JSON so they can be piped into deployment scripts.

use clap::{Parser, Subcommand};
use merkle_airdrop::{batch, leaf_hash, verify, Address, BuildConfig, Hash, TreeStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "airdrop")]
#[command(about = "Build Merkle trees and proofs for token airdrops")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the tree and proof artifacts from address,amount rows
    Build {
        /// Allocation rows (address,amount)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Tree artifact output
        #[arg(short, long)]
        tree: Option<PathBuf>,
        /// Proof artifact output
        #[arg(short, long)]
        proofs: Option<PathBuf>,
        /// Write the tree in compressed binary form
        #[arg(long)]
        binary: bool,
        /// JSON config file providing defaults for the options above
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the root of a stored tree
    Root {
        /// Tree artifact
        #[arg(short, long, default_value = "tree.json")]
        tree: PathBuf,
    },

    /// Print the proof for one address from a stored tree
    Proof {
        /// Tree artifact
        #[arg(short, long, default_value = "tree.json")]
        tree: PathBuf,
        /// Claimant address
        #[arg(short, long)]
        address: String,
    },

    /// Check a proof against a root
    Verify {
        /// Merkle root (hex)
        #[arg(short, long)]
        root: String,
        /// Claimant address
        #[arg(short, long)]
        address: String,
        /// Claimed amount
        #[arg(short = 'n', long)]
        amount: String,
        /// Comma-separated sibling hashes
        #[arg(short, long, value_delimiter = ',')]
        proof: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            tree,
            proofs,
            binary,
            config,
        } => {
            let mut build = BuildConfig::load_or_default(config.as_deref())?;
            if let Some(input) = input {
                build.input = input;
            }
            if let Some(tree) = tree {
                build.tree_output = tree;
            }
            if let Some(proofs) = proofs {
                build.proofs_output = proofs;
            }
            build.binary |= binary;

            let report = batch::run(&build)?;
            output(
                cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "root": report.root.to_hex(),
                    "leaves": report.leaves,
                    "height": report.height,
                    "total_amount": report.total_amount.to_string(),
                    "tree": build.tree_output.display().to_string(),
                    "proofs": build.proofs_output.display().to_string()
                }),
            )?;
        }

        Commands::Root { tree } => {
            let tree = TreeStore::open(&tree)?;
            output(
                cli.format,
                &serde_json::json!({
                    "root": tree.root().to_hex(),
                    "leaves": tree.len()
                }),
            )?;
        }

        Commands::Proof { tree, address } => {
            let tree = TreeStore::open(&tree)?;
            let address = Address::parse(&address)?;
            let index = tree
                .index_of(&address)
                .ok_or_else(|| anyhow::anyhow!("{} is not part of this tree", address))?;
            let allocation = tree
                .allocation(index)
                .ok_or_else(|| anyhow::anyhow!("leaf {} out of range", index))?;
            let proof = tree
                .proof(index)
                .ok_or_else(|| anyhow::anyhow!("leaf {} out of range", index))?;
            output(
                cli.format,
                &serde_json::json!({
                    "address": address.to_hex(),
                    "amount": allocation.amount.to_string(),
                    "index": index,
                    "leaf": allocation.leaf_hash().to_hex(),
                    "proof": proof.to_hex(),
                    "root": tree.root().to_hex()
                }),
            )?;
        }

        Commands::Verify {
            root,
            address,
            amount,
            proof,
        } => {
            let root = Hash::from_hex(&root)
                .map_err(|e| anyhow::anyhow!("Invalid root {:?}: {}", root, e))?;
            let address = Address::parse(&address)?;
            let amount = merkle_airdrop::model::parse_amount(&amount)?;
            let proof = proof
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    Hash::from_hex(s).map_err(|e| anyhow::anyhow!("Invalid proof hash {:?}: {}", s, e))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let leaf = leaf_hash(&address, amount);
            let valid = verify(&root, &leaf, &proof);
            output(
                cli.format,
                &serde_json::json!({
                    "valid": valid,
                    "leaf": leaf.to_hex(),
                    "root": root.to_hex()
                }),
            )?;
            if !valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn output(format: OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
