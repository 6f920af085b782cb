//! chunk/merger.rs
//! Reassembly of chunks that may arrive in any order.
//!
//! State machine: NEW → FILLING → READY → CONSUMED, and READY → EDITING →
//! READY for an in-place edit pass. `total_chunks` is latched by the first chunk. Any
//! rejected push aborts the merge and settles the readiness signal with the
//! error; chunks accepted before the failure are left untouched.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use futures::channel::oneshot;

use crate::chunk::types::{Chunk, ChunkError, MergeState};
use crate::utils::percent;

type ProgressFn = Box<dyn FnMut(u8) + Send>;

/// Settles once with `Ok(())` when every chunk arrived, or with the error
/// that aborted the merge.
pub type MergeReady = oneshot::Receiver<Result<(), ChunkError>>;

pub struct ChunkMerger {
    total_chunks: Option<usize>,
    received: BTreeMap<usize, Bytes>,
    state: MergeState,
    aborted: bool,
    edit_next: usize,
    on_progress: Option<ProgressFn>,
    ready_tx: Option<oneshot::Sender<Result<(), ChunkError>>>,
    ready_rx: Option<MergeReady>,
}

impl Default for ChunkMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkMerger {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            total_chunks: None,
            received: BTreeMap::new(),
            state: MergeState::New,
            aborted: false,
            edit_next: 0,
            on_progress: None,
            ready_tx: Some(tx),
            ready_rx: Some(rx),
        }
    }

    /// Percentage callback, driven by chunk count rather than bytes.
    pub fn with_progress<F>(mut self, cb: F) -> Self
    where
        F: FnMut(u8) + Send + 'static,
    {
        self.on_progress = Some(Box::new(cb));
        self
    }

    /// Readiness signal; available once.
    pub fn ready(&mut self) -> Option<MergeReady> {
        self.ready_rx.take()
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    pub fn total_chunks(&self) -> Option<usize> {
        self.total_chunks
    }

    pub fn received_count(&self) -> usize {
        self.received.len()
    }

    /// Bytes currently stored for `id`.
    pub fn peek(&self, id: usize) -> Option<&Bytes> {
        self.received.get(&id)
    }

    pub fn push(&mut self, chunk: Chunk) -> Result<(), ChunkError> {
        if self.aborted {
            return Err(ChunkError::Aborted);
        }
        if !matches!(self.state, MergeState::New | MergeState::Filling) {
            return Err(ChunkError::InvalidState { state: self.state });
        }

        let total = *self.total_chunks.get_or_insert(chunk.total_chunks);
        let check = if chunk.total_chunks != total {
            Err(ChunkError::TotalMismatch { id: chunk.id, expected: total, got: chunk.total_chunks })
        } else if chunk.id >= total {
            Err(ChunkError::OutOfRange { id: chunk.id, total })
        } else if self.received.contains_key(&chunk.id) {
            Err(ChunkError::Duplicate { id: chunk.id })
        } else {
            Ok(())
        };

        if let Err(err) = check {
            self.abort(&err);
            return Err(err);
        }

        self.received.insert(chunk.id, chunk.data);
        self.state = MergeState::Filling;
        self.report(self.received.len(), total);

        if self.received.len() == total {
            self.state = MergeState::Ready;
            if let Some(tx) = self.ready_tx.take() {
                let _ = tx.send(Ok(()));
            }
        }
        Ok(())
    }

    /// Concatenate by ascending id. Single use: the map is cleared and the
    /// merger moves to CONSUMED.
    pub fn get_result(&mut self) -> Result<Bytes, ChunkError> {
        if self.state != MergeState::Ready {
            return Err(ChunkError::InvalidState { state: self.state });
        }
        let received = std::mem::take(&mut self.received);
        let len = received.values().map(Bytes::len).sum();
        let mut out = BytesMut::with_capacity(len);
        for data in received.into_values() {
            out.extend_from_slice(&data);
        }
        self.state = MergeState::Consumed;
        Ok(out.freeze())
    }

    /// Start a manual edit pass (READY → EDITING).
    pub fn begin_edit(&mut self) -> Result<(), ChunkError> {
        if self.state != MergeState::Ready {
            return Err(ChunkError::InvalidState { state: self.state });
        }
        self.state = MergeState::Editing;
        self.edit_next = 0;
        Ok(())
    }

    /// Replace chunk `id`. Ids must arrive strictly in order; the pass
    /// completes (EDITING → READY) only after the last id.
    pub fn edit(&mut self, id: usize, data: Bytes) -> Result<(), ChunkError> {
        if self.state != MergeState::Editing {
            return Err(ChunkError::InvalidState { state: self.state });
        }
        let total = self.total_chunks.unwrap_or(0);
        if id != self.edit_next {
            return Err(ChunkError::EditOutOfOrder { expected: self.edit_next, got: id });
        }
        self.received.insert(id, data);
        self.edit_next += 1;
        self.report(self.edit_next, total);
        if self.edit_next == total {
            self.state = MergeState::Ready;
        }
        Ok(())
    }

    /// Replay every chunk through `edit_fn` in id order, storing the returned
    /// replacement (which may differ in size).
    pub fn foreach_edit<F, E>(&mut self, mut edit_fn: F) -> Result<(), E>
    where
        F: FnMut(usize, Bytes) -> Result<Bytes, E>,
        E: From<ChunkError>,
    {
        self.begin_edit()?;
        let total = self.total_chunks.unwrap_or(0);
        for id in 0..total {
            let current = self.received.get(&id).cloned().unwrap_or_default();
            let replacement = edit_fn(id, current)?;
            self.edit(id, replacement)?;
        }
        Ok(())
    }

    fn abort(&mut self, err: &ChunkError) {
        self.aborted = true;
        if let Some(tx) = self.ready_tx.take() {
            let _ = tx.send(Err(clone_reason(err)));
        }
    }

    fn report(&mut self, done: usize, total: usize) {
        if let Some(cb) = self.on_progress.as_mut() {
            cb(percent(done, total));
        }
    }
}

fn clone_reason(err: &ChunkError) -> ChunkError {
    match err {
        ChunkError::TotalMismatch { id, expected, got } => {
            ChunkError::TotalMismatch { id: *id, expected: *expected, got: *got }
        }
        ChunkError::OutOfRange { id, total } => ChunkError::OutOfRange { id: *id, total: *total },
        ChunkError::Duplicate { id } => ChunkError::Duplicate { id: *id },
        _ => ChunkError::Aborted,
    }
}
