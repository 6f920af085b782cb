//! compression/registry.rs
//! Factory functions mapping a codec to its streaming implementation.

use crate::compression::codecs::{deflate, zstd};
use crate::compression::constants::{DEFAULT_LEVEL_DEFLATE, DEFAULT_LEVEL_ZSTD};
use crate::compression::types::{CompressionCodec, CompressionError, Compressor, Decompressor};

pub fn default_level(codec: CompressionCodec) -> i32 {
    match codec {
        CompressionCodec::Deflate => DEFAULT_LEVEL_DEFLATE,
        CompressionCodec::Zstd    => DEFAULT_LEVEL_ZSTD,
    }
}

pub fn create_compressor(codec: CompressionCodec, level: Option<i32>)
    -> Result<Box<dyn Compressor + Send>, CompressionError>
{
    let level = level.unwrap_or_else(|| default_level(codec));
    match codec {
        CompressionCodec::Deflate => deflate::DeflateCompressor::new(level),
        CompressionCodec::Zstd    => zstd::ZstdCompressor::new(level),
    }
}

pub fn create_decompressor(codec: CompressionCodec)
    -> Result<Box<dyn Decompressor + Send>, CompressionError>
{
    match codec {
        CompressionCodec::Deflate => deflate::DeflateDecompressor::new(),
        CompressionCodec::Zstd    => zstd::ZstdDecompressor::new(),
    }
}
