//! compression/mod.rs
//! Incremental (stateful) compression and decompression.
//!
//! Notes:
//! - One state per stream. Every push returns whatever output that step
//!   produced; the codec buffers partial records internally.
//! - The final push flushes and consumes the state; later pushes fail.
//! - The registry builds the implementation for a codec.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;
pub mod stream;

pub use constants::*;
pub use types::*;
pub use registry::*;
pub use stream::*;
