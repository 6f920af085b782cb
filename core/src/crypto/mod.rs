//! crypto/mod.rs
//! Chunked authenticated encryption: AEAD primitives, per-stream key
//! derivation, counter nonces, the tagged chunk stream, and length-prefixed
//! frame transport.

pub mod types;
pub mod aead;
pub mod kdf;
pub mod nonce;
pub mod secretstream;
pub mod framing;

pub use types::*;
pub use aead::*;
pub use kdf::*;
pub use nonce::*;
pub use secretstream::*;
pub use framing::*;
