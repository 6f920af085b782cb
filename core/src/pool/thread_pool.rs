//! pool/thread_pool.rs
//! Thread pool: shared task queue, a set of supervised threads, and a
//! coordinator that reconciles membership against the target size.
//!
//! Design notes:
//! - All membership bookkeeping happens on one coordinator thread that
//!   consumes a command channel. Submitters only touch the queue.
//! - Reconciliation is additionally guarded by a busy flag, so a pass started
//!   from inside a pass is a no-op.
//! - Exiting threads report back through the command channel; the next pass
//!   replaces them (self-healing).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::pool::handle::{Task, TaskHandle};
use crate::pool::queue::{BlockingQueue, SizeCallback};
use crate::pool::thread::{EventHandler, Thread, ThreadOptions, WorkerTask};
use crate::pool::types::{ExitReason, PoolConfig, PoolStatus, ThreadStatus, UnitError};
use crate::pool::unit::Worker;

pub type WorkerFactory<W> = Arc<dyn Fn() -> W + Send + Sync>;

enum PoolCommand {
    Reconcile,
    MemberExited { id: usize, reason: ExitReason },
    Shutdown(Sender<()>),
    Restart(Sender<()>),
    Close,
}

/// State readable from any thread.
struct PoolShared {
    name: String,
    target_size: AtomicUsize,
    active: AtomicUsize,
    enabled: AtomicBool,
    next_task_id: AtomicU64,
    on_pool_size: Mutex<Option<SizeCallback>>,
}

impl PoolShared {
    fn publish_pool_size(&self, size: usize) {
        if self.active.swap(size, Ordering::SeqCst) == size {
            return;
        }
        let cb = self.on_pool_size.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(cb) = cb.as_ref() {
            cb(size);
        }
    }
}

pub struct ThreadPool<W: Worker> {
    shared: Arc<PoolShared>,
    queue: BlockingQueue<WorkerTask<W>>,
    commands: Sender<PoolCommand>,
    coordinator: Option<JoinHandle<()>>,
}

impl<W: Worker> ThreadPool<W> {
    /// Build a pool whose members are produced by `factory`. Events emitted by
    /// units are delivered to `on_event` on the member's supervisor thread.
    pub fn new<F, H>(config: PoolConfig, factory: F, on_event: H) -> Result<Self, UnitError>
    where
        F: Fn() -> W + Send + Sync + 'static,
        H: Fn(W::Event) + Send + Sync + 'static,
    {
        let shared = Arc::new(PoolShared {
            name: config.name.clone(),
            target_size: AtomicUsize::new(config.target_size),
            active: AtomicUsize::new(0),
            enabled: AtomicBool::new(true),
            next_task_id: AtomicU64::new(0),
            on_pool_size: Mutex::new(None),
        });
        let queue = BlockingQueue::new();
        let (cmd_tx, cmd_rx) = unbounded();

        let coordinator = Coordinator {
            shared: Arc::clone(&shared),
            queue: queue.clone(),
            factory: Arc::new(factory),
            on_event: Arc::new(on_event),
            options: ThreadOptions {
                name: config.name.clone(),
                terminate_on_error: config.terminate_on_error,
                handshake_timeout: config.handshake_timeout(),
            },
            members: BTreeMap::new(),
            next_member: 0,
            reconciling: false,
            commands: cmd_tx.clone(),
        };

        let join = thread::Builder::new()
            .name(format!("{}-coordinator", config.name))
            .spawn(move || coordinator.run(cmd_rx))?;

        info!(pool = %config.name, target = config.target_size, "thread pool created");
        let _ = cmd_tx.send(PoolCommand::Reconcile);

        Ok(Self {
            shared,
            queue,
            commands: cmd_tx,
            coordinator: Some(join),
        })
    }

    /// Enqueue `payload` and return its handle immediately.
    pub fn submit(&self, payload: W::Input) -> TaskHandle<W::Output, W::Error> {
        let id = self.shared.next_task_id.fetch_add(1, Ordering::SeqCst);
        let (task, handle) = Task::new(id, payload);
        self.queue.put(task);
        debug!(pool = %self.shared.name, task_id = id, "task submitted");
        handle
    }

    pub fn target_size(&self) -> usize {
        self.shared.target_size.load(Ordering::SeqCst)
    }

    /// Change the target; reconciliation runs on the coordinator.
    pub fn set_target_size(&self, size: usize) {
        self.shared.target_size.store(size, Ordering::SeqCst);
        info!(pool = %self.shared.name, target = size, "target size changed");
        if self.status() == PoolStatus::Enabled {
            let _ = self.commands.send(PoolCommand::Reconcile);
        }
    }

    /// Current member count, including members draining towards exit.
    pub fn pool_size(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn queue_size(&self) -> usize {
        self.queue.size()
    }

    pub fn status(&self) -> PoolStatus {
        if self.shared.enabled.load(Ordering::SeqCst) {
            PoolStatus::Enabled
        } else {
            PoolStatus::Disabled
        }
    }

    /// Called immediately with the current member count and on every change.
    pub fn subscribe_pool_size<F>(&self, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let mut slot = self.shared.on_pool_size.lock().unwrap_or_else(|p| p.into_inner());
        callback(self.pool_size());
        *slot = Some(Box::new(callback));
    }

    /// Called immediately with the current queue depth and on every change.
    pub fn subscribe_queue_size<F>(&self, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.queue.subscribe_size(callback);
    }

    /// Drop queued tasks, hard-terminate every member, disable the pool.
    /// Returns after the coordinator has applied it.
    pub fn shutdown(&self) {
        let (tx, rx) = bounded(1);
        if self.commands.send(PoolCommand::Shutdown(tx)).is_ok() {
            let _ = rx.recv();
        }
    }

    /// Shutdown if enabled, then re-enable and reconcile.
    pub fn restart(&self) {
        let (tx, rx) = bounded(1);
        if self.commands.send(PoolCommand::Restart(tx)).is_ok() {
            let _ = rx.recv();
        }
    }
}

impl<W: Worker> Drop for ThreadPool<W> {
    fn drop(&mut self) {
        let _ = self.commands.send(PoolCommand::Close);
        if let Some(join) = self.coordinator.take() {
            if join.join().is_err() {
                error!(pool = %self.shared.name, "coordinator panicked");
            }
        }
    }
}

struct Coordinator<W: Worker> {
    shared: Arc<PoolShared>,
    queue: BlockingQueue<WorkerTask<W>>,
    factory: WorkerFactory<W>,
    on_event: EventHandler<W::Event>,
    options: ThreadOptions,
    members: BTreeMap<usize, Thread>,
    next_member: usize,
    reconciling: bool,
    commands: Sender<PoolCommand>,
}

impl<W: Worker> Coordinator<W> {
    fn run(mut self, commands: Receiver<PoolCommand>) {
        while let Ok(cmd) = commands.recv() {
            match cmd {
                PoolCommand::Reconcile => self.reconcile(),
                PoolCommand::MemberExited { id, reason } => {
                    if let Some(member) = self.members.get_mut(&id) {
                        if reason.is_abnormal() {
                            warn!(pool = %self.shared.name, member = id, ?reason, "member lost, replacing");
                        }
                        member.terminate();
                    }
                    self.reconcile();
                }
                PoolCommand::Shutdown(ack) => {
                    self.shutdown();
                    let _ = ack.send(());
                }
                PoolCommand::Restart(ack) => {
                    if self.shared.enabled.load(Ordering::SeqCst) {
                        self.shutdown();
                    }
                    self.shared.enabled.store(true, Ordering::SeqCst);
                    info!(pool = %self.shared.name, "pool restarted");
                    self.reconcile();
                    let _ = ack.send(());
                }
                PoolCommand::Close => {
                    self.shutdown();
                    break;
                }
            }
        }
        debug!(pool = %self.shared.name, "coordinator stopped");
    }

    fn reconcile(&mut self) {
        if self.reconciling {
            return;
        }
        self.reconciling = true;

        // 1. Drop members that are gone.
        self.members.retain(|_, m| m.status() != ThreadStatus::Terminated);

        if self.shared.enabled.load(Ordering::SeqCst) {
            let target = self.shared.target_size.load(Ordering::SeqCst);
            let mut live = self.members.values().filter(|m| !m.is_stop_pending()).count();

            // 2. Grow to target.
            while live < target {
                match self.spawn_member() {
                    Ok(()) => live += 1,
                    Err(err) => {
                        error!(pool = %self.shared.name, %err, "failed to start member");
                        break;
                    }
                }
            }

            // 3. Retire exactly the overflow, gracefully.
            if live > target {
                let overflow = live - target;
                for member in self.members.values_mut().filter(|m| !m.is_stop_pending()).take(overflow) {
                    info!(pool = %self.shared.name, member = member.id(), "requesting graceful stop");
                    let _ = member.request_terminate();
                }
            }
        }

        self.reconciling = false;
        self.shared.publish_pool_size(self.members.len());
    }

    fn spawn_member(&mut self) -> Result<(), UnitError> {
        let id = self.next_member;
        self.next_member += 1;

        let commands = self.commands.clone();
        let on_exit = Box::new(move |id: usize, reason: ExitReason| {
            let _ = commands.send(PoolCommand::MemberExited { id, reason });
        });

        let thread = Thread::start(
            id,
            (self.factory)(),
            self.queue.clone(),
            Arc::clone(&self.on_event),
            self.options.clone(),
            on_exit,
        )?;
        debug!(pool = %self.shared.name, member = id, "member started");
        self.members.insert(id, thread);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.queue.clear();
        for member in self.members.values_mut() {
            member.terminate();
        }
        self.members.clear();
        self.shared.enabled.store(false, Ordering::SeqCst);
        self.shared.publish_pool_size(0);
        info!(pool = %self.shared.name, "pool shut down");
    }
}
