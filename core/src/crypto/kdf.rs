//! crypto/kdf.rs
//! Per-stream key derivation.
//!
//! HKDF-Extract(salt = header.salt, ikm = master key), then HKDF-Expand with
//! an info string that binds the full encoded stream header. A header edited
//! in transit therefore yields a different key and every chunk fails to open.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::crypto::secretstream::StreamHeader;
use crate::crypto::types::{CryptoError, SecretKey, KEY_LEN_32};

const INFO_LABEL: &[u8] = b"filecrypt|stream|v1|";

/// Derive the 32-byte AEAD key for one stream.
pub fn derive_stream_key(master_key: &SecretKey, header: &StreamHeader) -> Result<[u8; KEY_LEN_32], CryptoError> {
    crate::crypto::nonce::validate_salt(&header.salt)?;

    let mut info = Vec::with_capacity(INFO_LABEL.len() + StreamHeader::LEN);
    info.extend_from_slice(INFO_LABEL);
    info.extend_from_slice(&header.to_bytes());

    let hk = Hkdf::<Sha256>::new(Some(&header.salt), master_key.as_bytes());
    let mut key = [0u8; KEY_LEN_32];
    hk.expand(&info, &mut key)
        .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;
    Ok(key)
}
