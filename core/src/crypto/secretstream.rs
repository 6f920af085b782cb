//! crypto/secretstream.rs
//! Tagged chunk stream over a per-stream AEAD key.
//!
//! Wire model:
//! - A 24-byte `StreamHeader` travels once, out of band, before any chunk.
//! - Each chunk seals `tag ‖ data` under nonce(salt, counter) with the
//!   encoded header as AAD. The tag is `Message` or `Final`.
//! - Reordered, dropped, or replayed chunks fail authentication because the
//!   counter is implicit. A stream truncated before its `Final` chunk is caught
//!   by `verify_final_position` at the caller.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use rand::RngCore;

use crate::crypto::aead::AeadImpl;
use crate::crypto::kdf::derive_stream_key;
use crate::crypto::nonce::derive_nonce_12_tls_style;
use crate::crypto::types::{ChunkTag, CipherSuite, CryptoError, NonceError, SecretKey, SALT_LEN};

pub const STREAM_MAGIC: [u8; 4] = *b"FCS1";
pub const STREAM_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub version: u8,
    pub suite: CipherSuite,
    pub salt: [u8; SALT_LEN],
}

impl StreamHeader {
    pub const LEN: usize = 24;

    /// Fresh header with a random non-zero salt.
    pub fn generate(suite: CipherSuite) -> Self {
        let mut salt = [0u8; SALT_LEN];
        let mut rng = rand::rngs::OsRng;
        while salt.iter().all(|&b| b == 0) {
            rng.fill_bytes(&mut salt);
        }
        Self { version: STREAM_VERSION, suite, salt }
    }

    /// `magic(4) ‖ version(1) ‖ reserved(1) ‖ suite(u16 LE) ‖ salt(16)`
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&STREAM_MAGIC);
        out[4] = self.version;
        out[5] = 0;
        LittleEndian::write_u16(&mut out[6..8], self.suite as u16);
        out[8..].copy_from_slice(&self.salt);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::InvalidHeader(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        if bytes[0..4] != STREAM_MAGIC {
            return Err(CryptoError::InvalidHeader("bad magic".into()));
        }
        if bytes[4] != STREAM_VERSION {
            return Err(CryptoError::InvalidHeader(format!("unsupported version {}", bytes[4])));
        }
        if bytes[5] != 0 {
            return Err(CryptoError::InvalidHeader("reserved byte must be zero".into()));
        }

        let cipher_id = LittleEndian::read_u16(&bytes[6..8]);
        let suite = CipherSuite::try_from(cipher_id)
            .map_err(|_| CryptoError::UnsupportedCipher { cipher_id })?;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[8..]);
        crate::crypto::nonce::validate_salt(&salt)?;

        Ok(Self { version: bytes[4], suite, salt })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|e| CryptoError::InvalidHeader(e.to_string()))?;
        Self::from_bytes(&raw)
    }
}

/// Counter and cipher shared by both directions.
struct StreamCore {
    aead: AeadImpl,
    salt: [u8; SALT_LEN],
    aad: [u8; StreamHeader::LEN],
    counter: u64,
    finished: bool,
}

impl StreamCore {
    fn new(key: &SecretKey, header: &StreamHeader) -> Result<Self, CryptoError> {
        let stream_key = derive_stream_key(key, header)?;
        Ok(Self {
            aead: AeadImpl::from_suite(header.suite, &stream_key)?,
            salt: header.salt,
            aad: header.to_bytes(),
            counter: 0,
            finished: false,
        })
    }

    fn next_nonce(&mut self) -> Result<[u8; 12], CryptoError> {
        if self.finished {
            return Err(CryptoError::StreamFinished);
        }
        let nonce = derive_nonce_12_tls_style(&self.salt, self.counter)?;
        self.counter = self.counter.checked_add(1).ok_or(NonceError::CounterOverflow)?;
        Ok(nonce)
    }

    /// Run one chunk operation; an error closes the stream.
    fn settle<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T, CryptoError>) -> Result<T, CryptoError> {
        let res = op(self);
        if res.is_err() {
            self.finished = true;
        }
        res
    }
}

pub struct EncryptState {
    core: StreamCore,
}

pub struct DecryptState {
    core: StreamCore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedChunk {
    pub data: Bytes,
    pub is_final: bool,
}

/// Start an encrypting stream. The returned header must reach the receiver
/// before the first chunk.
pub fn init_encryption(key: &SecretKey, suite: CipherSuite) -> Result<(EncryptState, StreamHeader), CryptoError> {
    let header = StreamHeader::generate(suite);
    let core = StreamCore::new(key, &header)?;
    Ok((EncryptState { core }, header))
}

pub fn init_decryption(key: &SecretKey, header: &StreamHeader) -> Result<DecryptState, CryptoError> {
    Ok(DecryptState { core: StreamCore::new(key, header)? })
}

/// Seal one chunk; `is_final` closes the stream. Any error also closes it:
/// the counter has moved on, so later calls fail with `StreamFinished`.
pub fn encrypt_chunk(state: &mut EncryptState, chunk: &[u8], is_final: bool) -> Result<Vec<u8>, CryptoError> {
    let core = &mut state.core;
    let sealed = core.settle(|core| {
        let nonce = core.next_nonce()?;
        let tag = if is_final { ChunkTag::Final } else { ChunkTag::Message };

        let mut plaintext = Vec::with_capacity(1 + chunk.len());
        plaintext.push(tag as u8);
        plaintext.extend_from_slice(chunk);

        core.aead.seal(&nonce, &core.aad, &plaintext)
    })?;
    core.finished = is_final;
    Ok(sealed)
}

/// Open one chunk. As with encryption, a failed call leaves the state
/// finished.
pub fn decrypt_chunk(state: &mut DecryptState, chunk: &[u8]) -> Result<DecryptedChunk, CryptoError> {
    let core = &mut state.core;
    let opened = core.settle(|core| {
        let nonce = core.next_nonce()?;
        let plaintext = core.aead.open(&nonce, &core.aad, chunk)?;

        let raw = *plaintext.first().ok_or(CryptoError::TagMismatch)?;
        let tag = ChunkTag::try_from(raw).map_err(|_| CryptoError::InvalidChunkTag(raw))?;
        Ok(DecryptedChunk { data: Bytes::from(plaintext).slice(1..), is_final: tag == ChunkTag::Final })
    })?;
    core.finished = opened.is_final;
    Ok(opened)
}

/// FINAL must be set on the last chunk and only there.
pub fn verify_final_position(chunk: &DecryptedChunk, is_last: bool) -> Result<(), CryptoError> {
    if chunk.is_final != is_last {
        return Err(CryptoError::FinalTagMismatch { is_last, is_final: chunk.is_final });
    }
    Ok(())
}

impl EncryptState {
    pub fn suite(&self) -> CipherSuite {
        self.core.aead.suite()
    }

    pub fn chunks_sealed(&self) -> u64 {
        self.core.counter
    }

    pub fn is_finished(&self) -> bool {
        self.core.finished
    }
}

impl DecryptState {
    pub fn suite(&self) -> CipherSuite {
        self.core.aead.suite()
    }

    pub fn chunks_opened(&self) -> u64 {
        self.core.counter
    }

    pub fn is_finished(&self) -> bool {
        self.core.finished
    }
}
