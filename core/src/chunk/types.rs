use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;

/// One ordered slice of a larger byte sequence.
///
/// `start`/`end` are offsets inside the chunked region (after any skipped
/// header), so `start == id * chunk_size` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: usize,
    pub data: Bytes,
    pub total_size: u64,
    pub total_chunks: usize,
    pub start: u64,
    pub end: u64,
}

impl Chunk {
    #[inline]
    pub fn is_last(&self) -> bool {
        self.id + 1 == self.total_chunks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    New,
    Filling,
    Ready,
    Editing,
    /// Result taken; the merger accepts nothing further.
    Consumed,
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("source has no bytes to chunk (len={len}, offset={offset})")]
    EmptySource { len: u64, offset: u64 },

    #[error("chunk {id} declares {got} total chunks, merge expects {expected}")]
    TotalMismatch { id: usize, expected: usize, got: usize },

    #[error("chunk id {id} out of range 0..{total}")]
    OutOfRange { id: usize, total: usize },

    #[error("duplicate chunk id {id}")]
    Duplicate { id: usize },

    #[error("operation not allowed in state {state:?}")]
    InvalidState { state: MergeState },

    #[error("edit out of order: expected id {expected}, got {got}")]
    EditOutOfOrder { expected: usize, got: usize },

    #[error("merge aborted by an earlier error")]
    Aborted,

    #[error("I/O error while reading chunk: {0}")]
    Io(#[from] io::Error),
}

/// Randomly-accessible byte source for the splitter.
pub trait ChunkSource {
    fn total_len(&self) -> io::Result<u64>;

    /// Read `[start, end)`; `end` never exceeds `total_len`.
    fn read_range(&mut self, start: u64, end: u64) -> io::Result<Bytes>;
}

impl ChunkSource for Bytes {
    fn total_len(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_range(&mut self, start: u64, end: u64) -> io::Result<Bytes> {
        Ok(self.slice(start as usize..end as usize))
    }
}

impl ChunkSource for File {
    fn total_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn read_range(&mut self, start: u64, end: u64) -> io::Result<Bytes> {
        self.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start) as usize];
        self.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn total_len(&self) -> io::Result<u64> {
        (**self).total_len()
    }

    fn read_range(&mut self, start: u64, end: u64) -> io::Result<Bytes> {
        (**self).read_range(start, end)
    }
}
