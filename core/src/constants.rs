/// Container marker at the start of the metadata region.
/// "HJM1" = metadata-prefixed container v1
pub const CONTAINER_MAGIC: [u8; 4] = *b"HJM1";

/// Extension that classifies an input as a container.
pub const CONTAINER_EXTENSION: &str = "hjm";

/// Upper bound on the encoded metadata region (64 KiB).
pub const MAX_METADATA_LEN: usize = 64 * 1024;

/// Plaintext read granularity on the seal path (20 MiB).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 20 * 1024 * 1024;

/// Compressed bytes per encrypted chunk (30 MiB).
pub const DEFAULT_CIPHER_CHUNK_SIZE: usize = 30 * 1024 * 1024;

/// Max chunk size sanity bound (256 MiB).
pub const MAX_CHUNK_SIZE: usize = 256 * 1024 * 1024;

/// Default number of worker threads when none is configured.
pub const DEFAULT_POOL_SIZE: usize = 2;

/// Liveness handshake bound for a freshly spawned execution unit.
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 1_000;

/// Progress weights (percent) of the first and second pipeline phase.
pub const FIRST_PHASE_WEIGHT: f32 = 70.0;
pub const SECOND_PHASE_WEIGHT: f32 = 30.0;

/// Cipher suite identifiers (mirrored in the stream header).
pub mod cipher_ids {
    pub const AES256_GCM: u16        = 0x0001;
    pub const CHACHA20_POLY1305: u16 = 0x0002;
}
