//! Deflate (zlib wrapper) via flate2, one continuous stream across chunks.

use std::io::Write;
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};

use crate::compression::constants::DEFLATE_LEVELS;
use crate::compression::types::{process_failed, CompressionError, Compressor, DecodeStep, Decompressor};

const CODEC: &str = "deflate";

pub struct DeflateCompressor {
    enc: ZlibEncoder<Vec<u8>>,
}

impl DeflateCompressor {
    pub fn new(level: i32) -> Result<Box<dyn Compressor + Send>, CompressionError> {
        if !DEFLATE_LEVELS.contains(&level) {
            return Err(CompressionError::InvalidLevel { codec: CODEC, level });
        }
        let enc = ZlibEncoder::new(Vec::new(), Compression::new(level as u32));
        Ok(Box::new(Self { enc }))
    }
}

impl Compressor for DeflateCompressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        self.enc.write_all(input).map_err(process_failed(CODEC))?;
        // Drain what the encoder has emitted so far; partial blocks stay inside.
        out.append(self.enc.get_mut());
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        self.enc.try_finish().map_err(process_failed(CODEC))?;
        out.append(self.enc.get_mut());
        Ok(())
    }
}

pub struct DeflateDecompressor {
    dec: Decompress,
}

impl DeflateDecompressor {
    pub fn new() -> Result<Box<dyn Decompressor + Send>, CompressionError> {
        Ok(Box::new(Self { dec: Decompress::new(true) }))
    }
}

impl Decompressor for DeflateDecompressor {
    fn decompress_step(&mut self, input: &[u8], out: &mut [u8]) -> Result<DecodeStep, CompressionError> {
        let (in_before, out_before) = (self.dec.total_in(), self.dec.total_out());
        let status = self
            .dec
            .decompress(input, out, FlushDecompress::None)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: CODEC, msg: e.to_string() })?;
        Ok(DecodeStep {
            consumed: (self.dec.total_in() - in_before) as usize,
            produced: (self.dec.total_out() - out_before) as usize,
            stream_end: status == Status::StreamEnd,
        })
    }
}
