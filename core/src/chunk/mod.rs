//! chunk/mod.rs
//! Chunking primitives: splitter, merger, and re-chunking collector.

pub mod types;
pub mod splitter;
pub mod merger;
pub mod collector;

pub use types::*;
pub use splitter::{split_bytes, split_into_chunks, Splitter};
pub use merger::{ChunkMerger, MergeReady};
pub use collector::ChunkCollector;
