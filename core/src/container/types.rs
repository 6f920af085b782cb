use std::io;
use serde::{Deserialize, Serialize};

use crate::compression::CompressionCodec;
use crate::constants::DEFAULT_CIPHER_CHUNK_SIZE;
use crate::crypto::{CryptoError, StreamHeader};

/// Bytes of the metadata length prefix.
pub const METADATA_PREFIX_LEN: usize = 4;

/// Bytes of the trailing CRC32 inside the metadata region.
pub const METADATA_CRC_LEN: usize = 4;

/// Describes the sealed payload that follows it.
///
/// Serialized as JSON inside the metadata region:
/// `magic(4) ‖ json ‖ crc32(json) u32 LE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Name the payload had before sealing.
    pub file_name: String,

    /// Hex-encoded `StreamHeader`.
    pub header: String,

    #[serde(default)]
    pub codec: CompressionCodec,

    /// Plaintext bytes per sealed chunk; payload chunks are this plus
    /// `CHUNK_OVERHEAD`.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CIPHER_CHUNK_SIZE
}

impl Metadata {
    pub fn new(
        file_name: impl Into<String>,
        header: &StreamHeader,
        codec: CompressionCodec,
        chunk_size: usize,
    ) -> Self {
        Self { file_name: file_name.into(), header: header.to_hex(), codec, chunk_size }
    }

    pub fn stream_header(&self) -> Result<StreamHeader, ContainerError> {
        StreamHeader::from_hex(&self.header).map_err(ContainerError::InvalidHeader)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container too short: have {have} bytes, need {need}")]
    TooShort { have: u64, need: u64 },

    #[error("metadata length {len} exceeds limit {max}")]
    MetadataTooLarge { len: usize, max: usize },

    #[error("invalid container magic {have:02x?}")]
    InvalidMagic { have: [u8; 4] },

    #[error("metadata checksum mismatch: stored {have:#010x}, computed {need:#010x}")]
    ChecksumMismatch { have: u32, need: u32 },

    #[error("metadata is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("metadata declares unusable chunk size {0}")]
    InvalidChunkSize(usize),

    #[error("metadata carries an invalid stream header: {0}")]
    InvalidHeader(CryptoError),

    #[error("I/O error while reading container: {0}")]
    Io(#[from] io::Error),
}
