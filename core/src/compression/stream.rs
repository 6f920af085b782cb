//! compression/stream.rs
//! One-shot incremental compression state.
//!
//! `init_*` builds the state, `*_chunk` pushes one chunk with an `is_final`
//! flag. Output size per step need not match input size. After the final push
//! the state is spent and further pushes return `CompressionError::Finished`.
//!
//! Decompression hands its output out in windows of at most
//! `DECOMPRESS_WINDOW` bytes (see `DecompressionState::push_into`), so a
//! small, highly compressed chunk never inflates into one large buffer.

use crate::compression::constants::DECOMPRESS_WINDOW;
use crate::compression::registry::{create_compressor, create_decompressor};
use crate::compression::types::{CompressionCodec, CompressionError, Compressor, Decompressor};

pub struct CompressionState {
    codec: CompressionCodec,
    inner: Option<Box<dyn Compressor + Send>>,
    bytes_in: u64,
    bytes_out: u64,
}

pub struct DecompressionState {
    codec: CompressionCodec,
    inner: Option<Box<dyn Decompressor + Send>>,
    window: Vec<u8>,
    stream_end: bool,
    bytes_in: u64,
    bytes_out: u64,
}

pub fn init_compression(codec: CompressionCodec, level: Option<i32>) -> Result<CompressionState, CompressionError> {
    Ok(CompressionState {
        codec,
        inner: Some(create_compressor(codec, level)?),
        bytes_in: 0,
        bytes_out: 0,
    })
}

pub fn init_decompression(codec: CompressionCodec) -> Result<DecompressionState, CompressionError> {
    Ok(DecompressionState {
        codec,
        inner: Some(create_decompressor(codec)?),
        window: vec![0u8; DECOMPRESS_WINDOW],
        stream_end: false,
        bytes_in: 0,
        bytes_out: 0,
    })
}

pub fn compress_chunk(state: &mut CompressionState, chunk: &[u8], is_final: bool) -> Result<Vec<u8>, CompressionError> {
    state.push(chunk, is_final)
}

pub fn decompress_chunk(state: &mut DecompressionState, chunk: &[u8], is_final: bool) -> Result<Vec<u8>, CompressionError> {
    state.push(chunk, is_final)
}

impl CompressionState {
    pub fn push(&mut self, chunk: &[u8], is_final: bool) -> Result<Vec<u8>, CompressionError> {
        let codec = self.inner.as_mut().ok_or(CompressionError::Finished)?;
        let mut out = Vec::new();
        codec.compress_chunk(chunk, &mut out)?;
        if is_final {
            codec.finish(&mut out)?;
            self.inner = None;
        }
        self.bytes_in += chunk.len() as u64;
        self.bytes_out += out.len() as u64;
        Ok(out)
    }

    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
}

impl DecompressionState {
    /// Cap the size of each decoded piece (at least one byte).
    pub fn with_window(mut self, size: usize) -> Self {
        self.window = vec![0u8; size.max(1)];
        self
    }

    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    /// Decode `chunk` and collect the output.
    pub fn push(&mut self, chunk: &[u8], is_final: bool) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::new();
        self.push_into(chunk, is_final, |piece: &[u8]| -> Result<(), CompressionError> {
            out.extend_from_slice(piece);
            Ok(())
        })?;
        Ok(out)
    }

    /// Decode `chunk`, passing each window of output to `emit` before the
    /// next one is produced. On the final push the compressed stream must
    /// end exactly at the end of `chunk`.
    pub fn push_into<F, E>(&mut self, chunk: &[u8], is_final: bool, mut emit: F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
        E: From<CompressionError>,
    {
        let codec = self.inner.as_mut().ok_or(CompressionError::Finished)?;
        let name = self.codec.name();
        let failed = |msg: String| CompressionError::CodecProcessFailed { codec: name, msg };

        let mut input = chunk;
        while !self.stream_end {
            let step = codec.decompress_step(input, &mut self.window)?;
            input = &input[step.consumed..];
            self.bytes_in += step.consumed as u64;
            if step.produced > 0 {
                self.bytes_out += step.produced as u64;
                emit(&self.window[..step.produced])?;
            }
            if step.stream_end {
                self.stream_end = true;
            } else if input.is_empty() && step.produced < self.window.len() {
                break;
            } else if step.consumed == 0 && step.produced == 0 {
                return Err(failed("decoder made no progress".into()).into());
            }
        }

        if self.stream_end && !input.is_empty() {
            return Err(failed(format!("{} bytes after end of stream", input.len())).into());
        }
        if is_final {
            self.inner = None;
            if !self.stream_end {
                return Err(failed("stream truncated".into()).into());
            }
        }
        Ok(())
    }

    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
}
