//! container/mod.rs
//! Metadata-prefixed container: `[u32 LE len][metadata][payload]`.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::encode_metadata;
pub use decode::{decode_metadata, read_metadata};
