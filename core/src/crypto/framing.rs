//! crypto/framing.rs
//! Length-prefixed transport for sealed chunks: `[u32 LE len][frame]` repeated.
//!
//! Used when the transport does not preserve chunk boundaries. The receiver
//! buffers until a whole frame is present before authenticating it.

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Buf, Bytes, BytesMut};

use crate::constants::MAX_CHUNK_SIZE;
use crate::crypto::secretstream::{decrypt_chunk, encrypt_chunk, DecryptState, DecryptedChunk, EncryptState};
use crate::crypto::types::{CryptoError, FrameError, CHUNK_OVERHEAD};

pub const FRAME_PREFIX_LEN: usize = 4;

/// Append `frame` to `out` with its length prefix.
pub fn encode_frame(frame: &[u8], out: &mut Vec<u8>) -> Result<(), FrameError> {
    let len = u32::try_from(frame.len())
        .map_err(|_| FrameError::TooLarge { len: frame.len(), max: u32::MAX as usize })?;
    let mut prefix = [0u8; FRAME_PREFIX_LEN];
    LittleEndian::write_u32(&mut prefix, len);
    out.extend_from_slice(&prefix);
    out.extend_from_slice(frame);
    Ok(())
}

/// Seal and frame one chunk in a single step.
pub fn encrypt_framed(state: &mut EncryptState, chunk: &[u8], is_final: bool) -> Result<Vec<u8>, CryptoError> {
    let sealed = encrypt_chunk(state, chunk, is_final)?;
    let mut out = Vec::with_capacity(FRAME_PREFIX_LEN + sealed.len());
    encode_frame(&sealed, &mut out)?;
    Ok(out)
}

pub struct FrameDecoder {
    buf: BytesMut,
    max_frame_len: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_len: usize) -> Self {
        Self { buf: BytesMut::new(), max_frame_len }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Next complete frame, or `None` until more bytes arrive.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        if self.buf.len() < FRAME_PREFIX_LEN {
            return Ok(None);
        }
        let len = LittleEndian::read_u32(&self.buf[..FRAME_PREFIX_LEN]) as usize;
        if len > self.max_frame_len {
            return Err(FrameError::TooLarge { len, max: self.max_frame_len });
        }
        if self.buf.len() < FRAME_PREFIX_LEN + len {
            return Ok(None);
        }
        self.buf.advance(FRAME_PREFIX_LEN);
        Ok(Some(self.buf.split_to(len).freeze()))
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Fails if the stream stopped inside a frame.
    pub fn finish(&self) -> Result<(), FrameError> {
        if !self.buf.is_empty() {
            return Err(FrameError::Truncated { buffered: self.buf.len() });
        }
        Ok(())
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(MAX_CHUNK_SIZE + CHUNK_OVERHEAD)
    }
}

/// Frame decoder feeding a decrypting stream.
pub struct FramedDecryptor {
    decoder: FrameDecoder,
    state: DecryptState,
    saw_final: bool,
}

impl FramedDecryptor {
    pub fn new(state: DecryptState) -> Self {
        Self { decoder: FrameDecoder::default(), state, saw_final: false }
    }

    pub fn with_max_frame_len(state: DecryptState, max_frame_len: usize) -> Self {
        Self { decoder: FrameDecoder::new(max_frame_len), state, saw_final: false }
    }

    /// Feed transport bytes; returns every chunk that became complete.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<DecryptedChunk>, CryptoError> {
        self.decoder.push(data);
        let mut out = Vec::new();
        while let Some(frame) = self.decoder.next_frame()? {
            let chunk = decrypt_chunk(&mut self.state, &frame)?;
            self.saw_final = chunk.is_final;
            out.push(chunk);
        }
        Ok(out)
    }

    /// End of transport: requires a FINAL chunk and no leftover bytes.
    pub fn finish(self) -> Result<(), CryptoError> {
        self.decoder.finish()?;
        if !self.saw_final {
            return Err(FrameError::MissingFinal.into());
        }
        Ok(())
    }
}
