//! Error types for merkle_airdrop

use crate::model::Address;
use thiserror::Error;

/// Result type alias for merkle_airdrop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building trees or executing claims
///
/// Off-line variants (`Input`, `Serialization`, `VersionMismatch`, I/O) abort a
/// batch run before any artifact is written. On-chain variants are revert
/// reasons: the transaction leaves no trace when one is returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input{}: {message}", at_line_suffix(.line))]
    Input { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid proof submitted")]
    ProofInvalid,

    #[error("No NFT detected for {0}")]
    Eligibility(Address),

    #[error("Airdrop already claimed by {0}")]
    AlreadyClaimed(Address),

    #[error("Cannot claim zero tokens")]
    ZeroAmount,

    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("Insufficient contract balance: {available} available, {required} required")]
    InsufficientContractBalance { available: u128, required: u128 },

    #[error("Root unchanged")]
    RootUnchanged,

    #[error("Unauthorized caller: {0}")]
    Unauthorized(Address),

    #[error("Token transfer failed: {0}")]
    Transfer(String),
}

fn at_line_suffix(line: &usize) -> String {
    match line {
        0 => String::new(),
        n => format!(" at line {n}"),
    }
}

impl Error {
    /// Input error that is not tied to a source line
    pub(crate) fn input(message: impl Into<String>) -> Self {
        Error::Input {
            line: 0,
            message: message.into(),
        }
    }

    /// Attach a 1-based source line to an input error
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Error::Input { message, .. } => Error::Input { line, message },
            other => other,
        }
    }
}
