//! chunk/splitter.rs
//! Deterministic sequential chunking of a byte source.
//!
//! Chunks tile `[offset, len)` exactly: `start_i = i * chunk_size`,
//! `end_i = min(start_i + chunk_size, total_size)`. A chunk is read only when
//! the consumer asks for it, so a synchronous callback is natural backpressure.

use bytes::Bytes;

use crate::chunk::types::{Chunk, ChunkError, ChunkSource};
use crate::utils::chunk_count;

/// Iterator over the chunks of a source, in ascending id order.
pub struct Splitter<'a, S: ChunkSource + ?Sized> {
    source: &'a mut S,
    chunk_size: usize,
    offset: u64,
    total_size: u64,
    total_chunks: usize,
    next_id: usize,
}

impl<'a, S: ChunkSource + ?Sized> Splitter<'a, S> {
    /// Fails fast on a zero chunk size or an empty region after `offset`.
    pub fn new(source: &'a mut S, chunk_size: usize, offset: u64) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidChunkSize);
        }
        let len = source.total_len()?;
        if len <= offset {
            return Err(ChunkError::EmptySource { len, offset });
        }
        let total_size = len - offset;

        Ok(Self {
            source,
            chunk_size,
            offset,
            total_size,
            total_chunks: chunk_count(total_size, chunk_size),
            next_id: 0,
        })
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}

impl<S: ChunkSource + ?Sized> Iterator for Splitter<'_, S> {
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_id >= self.total_chunks {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;

        let start = id as u64 * self.chunk_size as u64;
        let end = (start + self.chunk_size as u64).min(self.total_size);

        Some(
            self.source
                .read_range(self.offset + start, self.offset + end)
                .map(|data| Chunk {
                    id,
                    data,
                    total_size: self.total_size,
                    total_chunks: self.total_chunks,
                    start,
                    end,
                })
                .map_err(ChunkError::from),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total_chunks - self.next_id;
        (left, Some(left))
    }
}

/// Drive `on_chunk` over every chunk. Splitting stops at the first error.
/// Returns the number of chunks emitted.
pub fn split_into_chunks<S, F, E>(
    source: &mut S,
    chunk_size: usize,
    offset: u64,
    mut on_chunk: F,
) -> Result<usize, E>
where
    S: ChunkSource + ?Sized,
    F: FnMut(Chunk) -> Result<(), E>,
    E: From<ChunkError>,
{
    let splitter = Splitter::new(source, chunk_size, offset)?;
    let total = splitter.total_chunks();
    for chunk in splitter {
        on_chunk(chunk?)?;
    }
    Ok(total)
}

/// Split an in-memory blob into owned chunks (zero-copy slices).
pub fn split_bytes(blob: &Bytes, chunk_size: usize) -> Result<Vec<Chunk>, ChunkError> {
    let mut source = blob.clone();
    Splitter::new(&mut source, chunk_size, 0)?.collect()
}
