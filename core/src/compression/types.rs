use std::fmt;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::compression::constants::codec_ids;
use crate::utils::enum_name_or_hex;

#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    Deflate = codec_ids::DEFLATE,
    Zstd    = codec_ids::ZSTD,
}

impl CompressionCodec {
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(raw: u16) -> Result<Self, CompressionError> {
        Self::try_from_primitive(raw).map_err(|_| CompressionError::UnsupportedCodec { codec_id: raw })
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionCodec::Deflate => "deflate",
            CompressionCodec::Zstd    => "zstd",
        }
    }
}

impl Default for CompressionCodec {
    fn default() -> Self {
        CompressionCodec::Deflate
    }
}

#[derive(Debug)]
pub enum CompressionError {
    UnsupportedCodec { codec_id: u16 },
    InvalidLevel { codec: &'static str, level: i32 },
    CodecInitFailed { codec: &'static str, msg: String },
    CodecProcessFailed { codec: &'static str, msg: String },
    /// The stream already received its final chunk.
    Finished,
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CompressionError::*;
        match self {
            UnsupportedCodec { codec_id } =>
                write!(f, "unsupported compression codec: {}",
                       enum_name_or_hex::<CompressionCodec>(*codec_id)),
            InvalidLevel { codec, level } =>
                write!(f, "invalid {} level: {}", codec, level),
            CodecInitFailed { codec, msg } =>
                write!(f, "codec {} init failed: {}", codec, msg),
            CodecProcessFailed { codec, msg } =>
                write!(f, "codec {} process failed: {}", codec, msg),
            Finished =>
                write!(f, "compression stream already finished"),
        }
    }
}

impl std::error::Error for CompressionError {}

pub(crate) fn process_failed(codec: &'static str) -> impl Fn(std::io::Error) -> CompressionError {
    move |e| CompressionError::CodecProcessFailed { codec, msg: e.to_string() }
}

// Require Send so codec state can move onto worker threads.
pub trait Compressor: Send {
    /// Feed one chunk; append whatever output this step produced.
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError>;
    /// Flush and close the stream.
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), CompressionError>;
}

/// Progress of one bounded decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStep {
    pub consumed: usize,
    pub produced: usize,
    /// The compressed stream ended and every decoded byte has been handed out.
    pub stream_end: bool,
}

pub trait Decompressor: Send {
    /// Decode from `input` into `out`, stopping when either runs out.
    fn decompress_step(&mut self, input: &[u8], out: &mut [u8]) -> Result<DecodeStep, CompressionError>;
}
