//! crypto/nonce.rs
//! Counter nonces for the chunk stream.
//!
//! The first 12 salt bytes form a base IV; bytes 4..12 are XORed with the
//! little-endian chunk counter. Encrypt and decrypt must use the same schedule.
//! A (salt, counter) pair is never reused because the salt is random per stream.

use crate::crypto::types::{NonceError, NONCE_LEN_12, SALT_LEN};

#[inline]
pub fn derive_nonce_12_tls_style(salt: &[u8; SALT_LEN], counter: u64) -> Result<[u8; NONCE_LEN_12], NonceError> {
    validate_salt(salt)?;

    let mut nonce = [0u8; NONCE_LEN_12];
    nonce.copy_from_slice(&salt[..NONCE_LEN_12]);
    for (dst, src) in nonce[4..].iter_mut().zip(counter.to_le_bytes()) {
        *dst ^= src;
    }
    Ok(nonce)
}

/// All-zero salts are rejected.
#[inline]
pub fn validate_salt(salt: &[u8; SALT_LEN]) -> Result<(), NonceError> {
    if salt.iter().all(|&b| b == 0) {
        return Err(NonceError::InvalidSalt);
    }
    Ok(())
}
