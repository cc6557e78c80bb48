//! Byte encodings for tree artifacts
//!
//! Binary layout:
//! ```text
//! [HEADER: 44 bytes]
//!   - magic: 8 bytes ("AIRDROPT")
//!   - version: 4 bytes (u32 LE)
//!   - checksum: 32 bytes (BLAKE3 of the compressed payload)
//!
//! [PAYLOAD: variable]
//!   - zstd-compressed bincode of the TreeArtifact
//! ```
//!
//! The JSON encoding is the pretty-printed artifact itself.

use super::artifact::TreeArtifact;
use crate::{Error, Result, MAGIC, VERSION};

const HEADER_SIZE: usize = 44;

/// Encoding used when writing a tree artifact
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArtifactFormat {
    #[default]
    Json,
    Binary,
}

impl ArtifactFormat {
    /// Guess the encoding of stored bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(MAGIC) {
            return Some(ArtifactFormat::Binary);
        }
        let first = data.iter().find(|b| !b.is_ascii_whitespace())?;
        (*first == b'{').then_some(ArtifactFormat::Json)
    }
}

pub fn encode(artifact: &TreeArtifact, format: ArtifactFormat) -> Result<Vec<u8>> {
    match format {
        ArtifactFormat::Json => encode_json(artifact),
        ArtifactFormat::Binary => encode_binary(artifact),
    }
}

/// Decode bytes in either encoding
pub fn decode(data: &[u8]) -> Result<TreeArtifact> {
    match ArtifactFormat::detect(data) {
        Some(ArtifactFormat::Binary) => decode_binary(data),
        Some(ArtifactFormat::Json) => decode_json(data),
        None => Err(Error::Serialization("unrecognised tree artifact".into())),
    }
}

pub fn encode_json(artifact: &TreeArtifact) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(artifact)?)
}

pub fn decode_json(data: &[u8]) -> Result<TreeArtifact> {
    serde_json::from_slice(data)
        .map_err(|e| Error::Serialization(format!("corrupted tree JSON: {e}")))
}

pub fn encode_binary(artifact: &TreeArtifact) -> Result<Vec<u8>> {
    let raw = bincode::serialize(artifact)?;
    let payload = zstd::encode_all(raw.as_slice(), 3)?;
    let checksum = blake3::hash(&payload);

    let mut output = Vec::with_capacity(HEADER_SIZE + payload.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&VERSION.to_le_bytes());
    output.extend_from_slice(checksum.as_bytes());
    output.extend(payload);
    Ok(output)
}

pub fn decode_binary(data: &[u8]) -> Result<TreeArtifact> {
    if data.len() < HEADER_SIZE {
        return Err(Error::Serialization("truncated tree header".into()));
    }
    if &data[0..8] != MAGIC {
        return Err(Error::Serialization("invalid magic bytes".into()));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&data[8..12]);
    let version = u32::from_le_bytes(version);
    if version != VERSION {
        return Err(Error::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }

    let payload = &data[HEADER_SIZE..];
    if blake3::hash(payload).as_bytes() != &data[12..HEADER_SIZE] {
        return Err(Error::Serialization("checksum mismatch".into()));
    }

    let raw = zstd::decode_all(payload)
        .map_err(|e| Error::Serialization(format!("corrupted payload: {e}")))?;
    bincode::deserialize(&raw)
        .map_err(|e| Error::Serialization(format!("corrupted payload: {e}")))
}
