//! processor/file_processor.rs
//! `SecureFileProcessor`: submits files to a pool of `FileWorker`s and fans
//! their progress events out to one subscriber.
//!
//! Workers publish the terminal event of every file they run. Files that
//! never finish on a worker (dropped by `close`, lost to a crash, a failed
//! handshake or a hard stop) are settled by a per-processor settler thread,
//! which publishes FAIL_FILE_NOT_ALLOWED before the caller's handle resolves.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::thread;

use futures::channel::{mpsc, oneshot};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{error, info, warn};

use crate::crypto::SecretKey;
use crate::io::{InputSource, OutputSink};
use crate::pool::{PoolConfig, TaskError, ThreadPool, UnitError};
use crate::processor::types::{
    FileFailure, FileOutcome, ProcessInfo, ProcessStatus, ProcessorConfig, ProcessorError,
};
use crate::processor::worker::{FileJob, FileWorker};

pub type ProcessCallback = Arc<dyn Fn(ProcessInfo) + Send + Sync>;

type SubscriberSlot = Arc<Mutex<Option<ProcessCallback>>>;

type FileResult = Result<FileOutcome, TaskError<FileFailure>>;

type Settling = Pin<Box<dyn Future<Output = ()> + Send>>;

fn publish(slot: &SubscriberSlot, info: ProcessInfo) {
    let cb = slot.lock().unwrap_or_else(|p| p.into_inner()).clone();
    if let Some(cb) = cb {
        cb(info);
    }
}

/// Drive every queued settlement until the processor is dropped and the
/// last one completes.
fn run_settler(mut incoming: mpsc::UnboundedReceiver<Settling>) {
    futures::executor::block_on(async move {
        let mut pending: FuturesUnordered<Settling> = FuturesUnordered::new();
        loop {
            futures::select! {
                next = incoming.next() => match next {
                    Some(settling) => pending.push(settling),
                    None => break,
                },
                () = pending.select_next_some() => {}
            }
        }
        while pending.next().await.is_some() {}
    });
}

pub struct SecureFileProcessor {
    config: Arc<ProcessorConfig>,
    pool: ThreadPool<FileWorker>,
    subscriber: SubscriberSlot,
    settler: mpsc::UnboundedSender<Settling>,
    next_id: AtomicU64,
}

impl SecureFileProcessor {
    pub fn new(config: ProcessorConfig) -> Result<Self, ProcessorError> {
        config.validate()?;
        let config = Arc::new(config);
        let subscriber: SubscriberSlot = Arc::default();

        let pool_config = PoolConfig {
            name: "filecrypt".into(),
            target_size: config.pool_size,
            // A bad file must not cost the worker.
            terminate_on_error: false,
            handshake_timeout_ms: config.handshake_timeout_ms,
        };
        let factory_config = Arc::clone(&config);
        let events = Arc::clone(&subscriber);
        let pool = ThreadPool::new(
            pool_config,
            move || FileWorker::new(Arc::clone(&factory_config)),
            move |info| publish(&events, info),
        )?;

        let (settler, incoming) = mpsc::unbounded();
        thread::Builder::new()
            .name("filecrypt-settler".into())
            .spawn(move || run_settler(incoming))
            .map_err(UnitError::Spawn)?;

        info!(pool_size = config.pool_size, codec = ?config.codec, suite = ?config.cipher_suite, "processor started");
        Ok(Self { config, pool, subscriber, settler, next_id: AtomicU64::new(0) })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Queue one file. A WAITING event is published before this returns and
    /// exactly one terminal event follows, published before the handle
    /// resolves. Never fails: every outcome is reported through events and
    /// the returned handle.
    pub fn submit(&self, input: InputSource, key: SecretKey, sink: OutputSink) -> ProcessHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let waiting = ProcessInfo::waiting(id, input.name());
        publish(&self.subscriber, waiting.clone());

        let task = self.pool.submit(FileJob { task_id: id, input, key, sink });
        let (done, result) = oneshot::channel();
        let slot = Arc::clone(&self.subscriber);
        let info = waiting.clone();
        let settling = async move {
            let res = task.await;
            if let Err(err) = &res {
                // Worker failures already published their own terminal event.
                if err.worker_error().is_none() {
                    warn!(task_id = info.id, error = %err, "file did not run to completion");
                    publish(&slot, info.with_status(ProcessStatus::FailFileNotAllowed, 0));
                }
            }
            let _ = done.send(res);
        };
        if self.settler.unbounded_send(Box::pin(settling)).is_err() {
            error!(task_id = id, "settler thread is gone");
        }
        ProcessHandle { info: waiting, result }
    }

    /// Replace the progress subscriber.
    pub fn subscribe_process_info<F>(&self, callback: F)
    where
        F: Fn(ProcessInfo) + Send + Sync + 'static,
    {
        *self.subscriber.lock().unwrap_or_else(|p| p.into_inner()) = Some(Arc::new(callback));
    }

    pub fn subscribe_pool_size<F>(&self, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.pool.subscribe_pool_size(callback);
    }

    pub fn subscribe_queue_size<F>(&self, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.pool.subscribe_queue_size(callback);
    }

    pub fn set_target_pool_size(&self, size: usize) {
        self.pool.set_target_size(size);
    }

    pub fn pool_size(&self) -> usize {
        self.pool.pool_size()
    }

    pub fn queue_size(&self) -> usize {
        self.pool.queue_size()
    }

    /// Drop queued files and stop every worker. Pending handles resolve as
    /// failed.
    pub fn close(&self) {
        self.pool.shutdown();
    }

    pub fn restart(&self) {
        self.pool.restart();
    }
}

/// Completion of one submitted file.
#[must_use = "a process handle does nothing unless waited on"]
pub struct ProcessHandle {
    info: ProcessInfo,
    result: oneshot::Receiver<FileResult>,
}

impl ProcessHandle {
    pub fn id(&self) -> u64 {
        self.info.id
    }

    pub fn input_name(&self) -> &str {
        &self.info.input_name
    }

    /// Block until the file settles and return its terminal event.
    pub fn wait(self) -> ProcessInfo {
        futures::executor::block_on(self)
    }

    /// Block and return the full outcome, including telemetry or the cause
    /// of failure.
    pub fn wait_outcome(self) -> FileResult {
        futures::executor::block_on(self.result).unwrap_or(Err(TaskError::Dropped))
    }
}

impl Future for ProcessHandle {
    type Output = ProcessInfo;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ProcessInfo> {
        let this = self.get_mut();
        Pin::new(&mut this.result).poll(cx).map(|res| match res.unwrap_or(Err(TaskError::Dropped)) {
            Ok(outcome) => outcome.info,
            Err(TaskError::Failed(failure)) => failure.info,
            Err(_) => this.info.with_status(ProcessStatus::FailFileNotAllowed, 0),
        })
    }
}
