//! src/compression/codecs/zstd.rs
//!
//! Zstd streaming compressor/decompressor.
//!
//! Design notes:
//! - Compression wraps the `write`-side encoder over an in-memory Vec that is
//!   drained after every chunk.
//! - Decompression drives the raw decoder into a caller-sized window.
//! - Errors are mapped into `CompressionError` variants with codec context.

use std::io::Write;

use ::zstd::stream::raw::{Decoder, InBuffer, Operation, OutBuffer};

use crate::compression::constants::ZSTD_LEVELS;
use crate::compression::types::{process_failed, CompressionError, Compressor, DecodeStep, Decompressor};

const CODEC: &str = "zstd";

pub struct ZstdCompressor {
    enc: ::zstd::stream::write::Encoder<'static, Vec<u8>>,
}

impl ZstdCompressor {
    /// # Errors
    /// - `InvalidLevel` outside 1..=22.
    /// - `CodecInitFailed` if the encoder cannot be created.
    pub fn new(level: i32) -> Result<Box<dyn Compressor + Send>, CompressionError> {
        if !ZSTD_LEVELS.contains(&level) {
            return Err(CompressionError::InvalidLevel { codec: CODEC, level });
        }
        let enc = ::zstd::stream::write::Encoder::new(Vec::new(), level)
            .map_err(|e| CompressionError::CodecInitFailed { codec: CODEC, msg: e.to_string() })?;
        Ok(Box::new(Self { enc }))
    }
}

impl Compressor for ZstdCompressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        self.enc.write_all(input).map_err(process_failed(CODEC))?;
        out.append(self.enc.get_mut());
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        self.enc.do_finish().map_err(process_failed(CODEC))?;
        out.append(self.enc.get_mut());
        Ok(())
    }
}

pub struct ZstdDecompressor {
    dec: Decoder<'static>,
}

impl ZstdDecompressor {
    pub fn new() -> Result<Box<dyn Decompressor + Send>, CompressionError> {
        let dec = Decoder::new()
            .map_err(|e| CompressionError::CodecInitFailed { codec: CODEC, msg: e.to_string() })?;
        Ok(Box::new(Self { dec }))
    }
}

impl Decompressor for ZstdDecompressor {
    fn decompress_step(&mut self, input: &[u8], out: &mut [u8]) -> Result<DecodeStep, CompressionError> {
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(out);
        // A zero hint means the frame is complete and fully flushed.
        let hint = self.dec.run(&mut src, &mut dst).map_err(process_failed(CODEC))?;
        Ok(DecodeStep { consumed: src.pos, produced: dst.pos(), stream_end: hint == 0 })
    }
}
