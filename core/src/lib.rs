//! filecrypt-core
//!
//! Concurrent file sealing engine: a reconciling worker pool pulling from a
//! blocking queue, and a chunked compress-then-encrypt pipeline that never
//! holds a whole file in memory.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod io;

// Concurrency
pub mod pool;

// Streaming layers
pub mod chunk;
pub mod compression;
pub mod crypto;
pub mod container;
pub mod telemetry;

// Orchestration
pub mod processor;

// -----------------------------------------------------------------------------
// Prelude
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::CompressionCodec;
    pub use crate::crypto::{CipherSuite, SecretKey};
    pub use crate::io::{InputSource, OutputSink, SharedBuffer};
    pub use crate::processor::{ProcessHandle, ProcessInfo, ProcessStatus, ProcessorConfig, SecureFileProcessor};
    pub use crate::types::StreamError;
}
