//! chunk/collector.rs
//! Re-chunks an arbitrary byte stream into fixed-size pieces.
//!
//! A full piece is only emitted once at least one more byte is buffered, so
//! the piece flagged final is never lost when the stream length is an exact
//! multiple of the piece size. An empty stream yields one empty final piece.

use bytes::{Bytes, BytesMut};

pub struct ChunkCollector {
    chunk_size: usize,
    buffer: BytesMut,
    emitted: usize,
    finished: bool,
}

impl ChunkCollector {
    /// `chunk_size` must be non-zero; callers validate configuration first.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            buffer: BytesMut::new(),
            emitted: 0,
            finished: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Pieces emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Buffer `data` and emit every complete piece. With `is_final`, the
    /// remainder is emitted flagged final. Pushing after the final push is a
    /// no-op.
    pub fn push<F, E>(&mut self, data: &[u8], is_final: bool, mut emit: F) -> Result<(), E>
    where
        F: FnMut(Bytes, bool) -> Result<(), E>,
    {
        if self.finished {
            return Ok(());
        }
        self.buffer.extend_from_slice(data);

        while self.buffer.len() > self.chunk_size {
            let piece = self.buffer.split_to(self.chunk_size).freeze();
            self.emitted += 1;
            emit(piece, false)?;
        }

        if is_final {
            self.finished = true;
            let rest = self.buffer.split().freeze();
            self.emitted += 1;
            emit(rest, true)?;
        }
        Ok(())
    }
}
