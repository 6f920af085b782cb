//! pool/queue.rs
//! Blocking task queue with FIFO direct handoff to waiting consumers.
//!
//! Design notes:
//! - `put` never blocks. If a consumer is registered it receives the item
//!   directly; otherwise the item is buffered.
//! - `take` returns a [`Take`] handle backed by a one-slot channel, so a
//!   consumer can `select!` on it together with its own control channel.
//! - Size notifications run outside the lock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::pool::types::QueueError;

pub type SizeCallback = Box<dyn Fn(usize) + Send + Sync>;

struct QueueState<T> {
    items: VecDeque<T>,
    waiters: VecDeque<(u64, Sender<T>)>,
    next_waiter: u64,
}

struct QueueShared<T> {
    state: Mutex<QueueState<T>>,
    on_size: Mutex<Option<SizeCallback>>,
}

/// Cloneable handle; all clones share the same queue.
pub struct BlockingQueue<T> {
    shared: Arc<QueueShared<T>>,
}

impl<T> Clone for BlockingQueue<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(QueueShared {
                state: Mutex::new(QueueState {
                    items: VecDeque::new(),
                    waiters: VecDeque::new(),
                    next_waiter: 0,
                }),
                on_size: Mutex::new(None),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.shared.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn notify_size(&self, size: usize) {
        let cb = self.shared.on_size.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(cb) = cb.as_ref() {
            cb(size);
        }
    }

    /// Hand `item` to the oldest live waiter, or buffer it.
    pub fn put(&self, item: T) {
        self.insert(item, false);
    }

    /// Like [`put`](Self::put), but a buffered item goes to the head of the
    /// queue. Used to return an item that was claimed and then given back.
    pub fn put_front(&self, item: T) {
        self.insert(item, true);
    }

    fn insert(&self, item: T, front: bool) {
        let mut item = item;
        let size = {
            let mut state = self.lock();
            while let Some((_, waiter)) = state.waiters.pop_front() {
                match waiter.send(item) {
                    Ok(()) => return,
                    // Waiter abandoned its take; try the next one.
                    Err(err) => item = err.into_inner(),
                }
            }
            if front {
                state.items.push_front(item);
            } else {
                state.items.push_back(item);
            }
            state.items.len()
        };
        self.notify_size(size);
    }

    /// Claim the head item, or register as a waiter for the next `put`.
    pub fn take(&self) -> Take<T> {
        let (tx, rx) = bounded(1);
        let popped = {
            let mut state = self.lock();
            match state.items.pop_front() {
                Some(item) => {
                    // One-slot channel with a live receiver: cannot fail.
                    let _ = tx.send(item);
                    Some(state.items.len())
                }
                None => {
                    let id = state.next_waiter;
                    state.next_waiter += 1;
                    state.waiters.push_back((id, tx));
                    return Take { id: Some(id), rx, queue: self.clone() };
                }
            }
        };
        if let Some(size) = popped {
            self.notify_size(size);
        }
        Take { id: None, rx, queue: self.clone() }
    }

    /// Number of buffered items.
    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    /// Number of consumers currently registered.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Drop every buffered item and every waiter.
    ///
    /// Waiters observe [`QueueError::Cleared`] from [`Take::wait`].
    pub fn clear(&self) {
        let (items, waiters) = {
            let mut state = self.lock();
            (std::mem::take(&mut state.items), std::mem::take(&mut state.waiters))
        };
        // Drop outside the lock: items may own result senders.
        drop(waiters);
        drop(items);
        self.notify_size(0);
    }

    /// Replace the size subscriber; it is called at once with the current size.
    pub fn subscribe_size<F>(&self, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let size = self.size();
        callback(size);
        *self.shared.on_size.lock().unwrap_or_else(|p| p.into_inner()) = Some(Box::new(callback));
    }

    fn forget_waiter(&self, id: u64) {
        self.lock().waiters.retain(|(w, _)| *w != id);
    }
}

/// Pending or completed claim on the next queue item.
pub struct Take<T> {
    id: Option<u64>,
    rx: Receiver<T>,
    queue: BlockingQueue<T>,
}

impl<T> Take<T> {
    /// Block until an item is handed over.
    pub fn wait(self) -> Result<T, QueueError> {
        self.rx.recv().map_err(|_| QueueError::Cleared)
    }

    /// Channel end for use in `select!`.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }

    /// Withdraw the claim. Returns an item that was handed over before the
    /// waiter was removed, so nothing put concurrently is lost.
    pub fn cancel(self) -> Option<T> {
        if let Some(id) = self.id {
            self.queue.forget_waiter(id);
        }
        self.rx.try_recv().ok()
    }
}
