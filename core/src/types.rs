use std::io;
use crate::{
    chunk::ChunkError,
    compression::CompressionError,
    container::ContainerError,
    crypto::{CryptoError, FrameError, NonceError},
    processor::ProcessStatus,
};


/// Unified pipeline error covering I/O, chunking, compression, crypto, and container parsing.
/// - `From<T>` impls enable `?` across the pipeline.
/// - `fail_status` maps every error onto the orchestrator's failure states.
#[derive(Debug)]
pub enum StreamError {
    /// I/O error from a source or sink.
    Io(io::Error),

    /// Splitting, merging, or re-chunking failed.
    Chunk(ChunkError),

    /// Compression/decompression error.
    Compression(CompressionError),

    /// Cryptographic error (AEAD, header, final-tag policy).
    Crypto(CryptoError),

    /// Metadata region could not be read or validated.
    Container(ContainerError),

    /// Generic high-level validation with a descriptive message.
    Validation(String),
}

impl StreamError {
    /// Authentication failures read as a wrong key; everything else means
    /// the input is not something this pipeline accepts.
    pub fn fail_status(&self) -> ProcessStatus {
        match self {
            StreamError::Crypto(e) if e.is_auth_failure() => ProcessStatus::FailWrongKey,
            _ => ProcessStatus::FailFileNotAllowed,
        }
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::Chunk(e) => write!(f, "chunk error: {}", e),
            StreamError::Compression(e) => write!(f, "compression error: {}", e),
            StreamError::Crypto(e) => write!(f, "crypto error: {}", e),
            StreamError::Container(e) => write!(f, "container error: {}", e),
            StreamError::Validation(msg) => write!(f, "validation error: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<ChunkError> for StreamError {
    fn from(e: ChunkError) -> Self {
        StreamError::Chunk(e)
    }
}

impl From<CompressionError> for StreamError {
    fn from(e: CompressionError) -> Self {
        StreamError::Compression(e)
    }
}

impl From<CryptoError> for StreamError {
    fn from(e: CryptoError) -> Self {
        StreamError::Crypto(e)
    }
}

impl From<NonceError> for StreamError {
    fn from(e: NonceError) -> Self {
        StreamError::Crypto(CryptoError::Nonce(e))
    }
}

impl From<FrameError> for StreamError {
    fn from(e: FrameError) -> Self {
        StreamError::Crypto(CryptoError::Frame(e))
    }
}

impl From<ContainerError> for StreamError {
    fn from(e: ContainerError) -> Self {
        StreamError::Container(e)
    }
}
