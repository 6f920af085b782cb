//! telemetry/counters.rs
//! Byte and chunk counters collected while one file streams through the pipeline.

use std::ops::AddAssign;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub chunks_in: u64,
    pub chunks_out: u64,
    pub bytes_plaintext: u64,
    pub bytes_compressed: u64,
    pub bytes_ciphertext: u64,
    pub bytes_metadata: u64,
}

impl TelemetryCounters {
    /// Metadata region written ahead of (or read before) the payload.
    pub fn add_metadata(&mut self, len: usize) {
        self.bytes_metadata += len as u64;
    }

    /// One plaintext chunk read (seal) or written (open).
    pub fn add_plain(&mut self, len: usize) {
        self.bytes_plaintext += len as u64;
    }

    /// Bytes that went into, or came out of, the compression codec on the
    /// compressed side.
    pub fn add_compressed(&mut self, len: usize) {
        self.bytes_compressed += len as u64;
    }

    /// One sealed chunk produced or consumed.
    pub fn add_cipher_chunk(&mut self, len: usize) {
        self.bytes_ciphertext += len as u64;
    }

    pub fn add_chunk_in(&mut self) {
        self.chunks_in += 1;
    }

    pub fn add_chunk_out(&mut self) {
        self.chunks_out += 1;
    }

    /// Structural bytes that are neither plaintext nor compressed payload.
    pub fn overhead_bytes(&self) -> u64 {
        self.bytes_metadata + self.bytes_ciphertext.saturating_sub(self.bytes_compressed)
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks_in += other.chunks_in;
        self.chunks_out += other.chunks_out;
        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_compressed += other.bytes_compressed;
        self.bytes_ciphertext += other.bytes_ciphertext;
        self.bytes_metadata += other.bytes_metadata;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
