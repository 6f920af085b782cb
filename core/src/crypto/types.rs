use std::fmt;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::cipher_ids;
use crate::utils::enum_name_or_hex;

/// Stable key and nonce sizes.
pub const KEY_LEN_32: usize = 32;

/// Standard 12-byte nonce length for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// Per-stream random salt carried in the stream header.
pub const SALT_LEN: usize = 16;

/// Bytes added to every chunk: one tag byte plus the AEAD tag.
pub const CHUNK_OVERHEAD: usize = 1 + TAG_LEN;

#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherSuite {
    Aes256Gcm        = cipher_ids::AES256_GCM,
    ChaCha20Poly1305 = cipher_ids::CHACHA20_POLY1305,
}

impl Default for CipherSuite {
    fn default() -> Self {
        CipherSuite::ChaCha20Poly1305
    }
}

/// Chunk marker, sealed inside the authenticated plaintext.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum ChunkTag {
    Message = 0x00,
    Final   = 0x03,
}

/// 32-byte symmetric key supplied by the key-exchange collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_LEN_32]);

impl SecretKey {
    pub fn new(bytes: [u8; KEY_LEN_32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_LEN_32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLen {
            expected: KEY_LEN_32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN_32] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

#[derive(Debug)]
pub enum NonceError {
    /// Salt is invalid (e.g., all zeros).
    InvalidSalt,

    /// Chunk counter exhausted the nonce space.
    CounterOverflow,
}

impl fmt::Display for NonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonceError::InvalidSalt => write!(f, "invalid salt: all zeros"),
            NonceError::CounterOverflow => write!(f, "chunk counter overflow"),
        }
    }
}

impl std::error::Error for NonceError {}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame length {len} exceeds limit {max}")]
    TooLarge { len: usize, max: usize },

    #[error("stream ended inside a frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },

    #[error("stream ended without a final frame")]
    MissingFinal,
}

#[derive(Debug)]
pub enum CryptoError {
    /// Unsupported cipher suite ID from the stream header.
    UnsupportedCipher { cipher_id: u16 },

    /// Invalid key length provided to cipher.
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length mismatch (must be 12 bytes for supported ciphers).
    InvalidNonceLen { expected: usize, actual: usize },

    /// Stream header could not be parsed.
    InvalidHeader(String),

    /// AEAD tag mismatch (authentication failure).
    TagMismatch,

    /// Authenticated chunk carried an unknown marker byte.
    InvalidChunkTag(u8),

    /// FINAL marker seen early, or the last chunk was not FINAL.
    FinalTagMismatch { is_last: bool, is_final: bool },

    /// Chunk pushed after the FINAL chunk.
    StreamFinished,

    /// Transport framing error.
    Frame(FrameError),

    Nonce(NonceError),

    /// General runtime error with context.
    Failure(String),
}

impl CryptoError {
    /// Errors that mean "wrong key or tampered data".
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::TagMismatch
                | CryptoError::InvalidChunkTag(_)
                | CryptoError::FinalTagMismatch { .. }
                | CryptoError::StreamFinished
                | CryptoError::Frame(_)
        )
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CryptoError::*;
        match self {
            UnsupportedCipher { cipher_id } =>
                write!(f, "unsupported cipher suite: {}",
                       enum_name_or_hex::<CipherSuite>(*cipher_id)),
            InvalidKeyLen { expected, actual } =>
                write!(f, "invalid key length: expected={}, actual={}", expected, actual),
            InvalidNonceLen { expected, actual } =>
                write!(f, "invalid nonce length: expected={}, actual={}", expected, actual),
            InvalidHeader(msg) =>
                write!(f, "invalid stream header: {}", msg),
            TagMismatch =>
                write!(f, "AEAD tag mismatch"),
            InvalidChunkTag(raw) =>
                write!(f, "invalid chunk marker: {}", enum_name_or_hex::<ChunkTag>(*raw)),
            FinalTagMismatch { is_last, is_final } =>
                write!(f, "final marker mismatch: last_chunk={}, final_tag={}", is_last, is_final),
            StreamFinished =>
                write!(f, "chunk after final marker"),
            Frame(e) =>
                write!(f, "frame error: {}", e),
            Nonce(e) =>
                write!(f, "nonce error: {}", e),
            Failure(msg) =>
                write!(f, "crypto failure: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<NonceError> for CryptoError {
    fn from(e: NonceError) -> Self {
        CryptoError::Nonce(e)
    }
}

impl From<FrameError> for CryptoError {
    fn from(e: FrameError) -> Self {
        CryptoError::Frame(e)
    }
}
