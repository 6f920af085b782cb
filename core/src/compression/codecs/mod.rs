//! compression/codecs/mod.rs
//! Streaming codec implementations behind the `Compressor`/`Decompressor` seam.

pub mod deflate;
pub mod zstd;

pub use self::deflate::*;
pub use self::zstd::*;
