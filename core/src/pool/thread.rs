//! pool/thread.rs
//! Supervisor for one execution unit: fetch from the queue, dispatch, await
//! the reply, settle the task handle.
//!
//! Design notes:
//! - The control loop runs on its own OS thread and selects on the queue
//!   claim (or unit reply) together with a control channel, so both graceful
//!   and hard stops are observed while blocked.
//! - A graceful stop never loses a task: a claim that raced in while
//!   stopping is put back on the queue.
//! - Status is shared with the owning pool through an atomic.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{select, unbounded, Receiver, Sender};
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::pool::handle::Task;
use crate::pool::queue::BlockingQueue;
use crate::pool::types::{ExitReason, TaskError, ThreadStatus, UnitError};
use crate::pool::unit::{ExecutionUnit, UnitMessage, Worker};

pub(crate) type WorkerTask<W> =
    Task<<W as Worker>::Input, <W as Worker>::Output, <W as Worker>::Error>;

pub type EventHandler<V> = Arc<dyn Fn(V) + Send + Sync>;

pub(crate) type ExitHook = Box<dyn FnOnce(usize, ExitReason) + Send>;

enum Control {
    Stop,
    Kill,
}

/// Resolves once a thread's control loop has exited. Clones share the state.
#[derive(Clone)]
pub struct ExitSignal(Shared<oneshot::Receiver<()>>);

impl ExitSignal {
    pub fn is_done(&self) -> bool {
        self.0.peek().is_some()
    }

    pub fn wait(self) {
        futures::executor::block_on(self)
    }
}

impl Future for ExitSignal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.get_mut().0).poll(cx).map(|_| ())
    }
}

/// Per-thread settings copied from the pool.
#[derive(Clone)]
pub(crate) struct ThreadOptions {
    pub name: String,
    pub terminate_on_error: bool,
    pub handshake_timeout: Duration,
}

/// Pool-side handle of a supervised thread.
pub struct Thread {
    id: usize,
    status: Arc<AtomicU8>,
    control: Sender<Control>,
    exited: ExitSignal,
    stop_pending: bool,
}

impl Thread {
    /// Spawn the unit and start the control loop.
    pub(crate) fn start<W: Worker>(
        id: usize,
        worker: W,
        queue: BlockingQueue<WorkerTask<W>>,
        on_event: EventHandler<W::Event>,
        options: ThreadOptions,
        on_exit: ExitHook,
    ) -> Result<Self, UnitError> {
        let unit = ExecutionUnit::spawn(format!("{}-unit-{}", options.name, id), worker)?;

        let status = Arc::new(AtomicU8::new(ThreadStatus::New as u8));
        let (ctl_tx, ctl_rx) = unbounded();
        let (exit_tx, exit_rx) = oneshot::channel::<()>();

        let supervisor = Supervisor {
            id,
            unit: Some(unit),
            queue,
            on_event,
            status: Arc::clone(&status),
            control: ctl_rx,
            options: options.clone(),
        };

        thread::Builder::new()
            .name(format!("{}-thread-{}", options.name, id))
            .spawn(move || {
                let reason = supervisor.run();
                let _ = exit_tx.send(());
                on_exit(id, reason);
            })?;

        Ok(Self {
            id,
            status,
            control: ctl_tx,
            exited: ExitSignal(exit_rx.shared()),
            stop_pending: false,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn status(&self) -> ThreadStatus {
        load_status(&self.status)
    }

    pub fn is_stop_pending(&self) -> bool {
        self.stop_pending
    }

    /// Graceful stop after the current task. Repeated calls return the same
    /// signal without re-sending the request.
    pub fn request_terminate(&mut self) -> ExitSignal {
        if !self.stop_pending {
            self.stop_pending = true;
            let _ = self.control.send(Control::Stop);
        } else {
            debug!(member = self.id, "repeated terminate request");
        }
        self.exited.clone()
    }

    /// Hard stop: TERMINATED now, in-flight work is rejected.
    pub fn terminate(&mut self) {
        self.status.store(ThreadStatus::Terminated as u8, Ordering::SeqCst);
        self.stop_pending = true;
        let _ = self.control.send(Control::Kill);
    }

    pub fn exit_signal(&self) -> ExitSignal {
        self.exited.clone()
    }
}

fn load_status(status: &AtomicU8) -> ThreadStatus {
    ThreadStatus::try_from(status.load(Ordering::SeqCst)).unwrap_or(ThreadStatus::Terminated)
}

enum Claim<T> {
    Task(T),
    Cleared,
    Stop(ExitReason),
}

struct Supervisor<W: Worker> {
    id: usize,
    unit: Option<ExecutionUnit<W>>,
    queue: BlockingQueue<WorkerTask<W>>,
    on_event: EventHandler<W::Event>,
    status: Arc<AtomicU8>,
    control: Receiver<Control>,
    options: ThreadOptions,
}

impl<W: Worker> Supervisor<W> {
    fn set_status(&self, next: ThreadStatus) {
        // A hard terminate from the pool is final.
        let _ = self.status.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
            if cur == ThreadStatus::Terminated as u8 {
                None
            } else {
                Some(next as u8)
            }
        });
    }

    fn run(mut self) -> ExitReason {
        let reason = self.control_loop();
        if let Some(unit) = self.unit.take() {
            match reason {
                ExitReason::Requested | ExitReason::TaskFailed => unit.shutdown(),
                _ => unit.dispose(),
            }
        }
        self.status.store(ThreadStatus::Terminated as u8, Ordering::SeqCst);
        match &reason {
            r if r.is_abnormal() => warn!(pool = %self.options.name, member = self.id, reason = ?r, "thread loop exited"),
            r => info!(pool = %self.options.name, member = self.id, reason = ?r, "thread loop exited"),
        }
        reason
    }

    fn control_loop(&mut self) -> ExitReason {
        let mut run_flag = true;
        let mut exit = ExitReason::Requested;

        while run_flag {
            self.set_status(ThreadStatus::Blocked);
            let task = match self.claim() {
                Claim::Task(task) => task,
                Claim::Cleared => continue,
                Claim::Stop(reason) => return reason,
            };

            self.set_status(ThreadStatus::Running);
            let Some(unit) = self.unit.as_mut() else {
                task.reject(TaskError::UnitCrashed);
                return ExitReason::Crashed;
            };

            if !unit.is_acknowledged() {
                if let Err(err) = unit.probe(self.options.handshake_timeout) {
                    let msg = err.to_string();
                    task.reject(err.into());
                    return ExitReason::Fatal(msg);
                }
            }

            let Task { id: task_id, payload, result } = task;
            if unit.dispatch(payload).is_err() {
                let _ = result.send(Err(TaskError::UnitCrashed));
                return ExitReason::Crashed;
            }
            debug!(member = self.id, task_id, "task dispatched");

            loop {
                select! {
                    recv(unit.messages()) -> msg => match msg {
                        Ok(UnitMessage::Return(out)) => {
                            let _ = result.send(Ok(out));
                            break;
                        }
                        Ok(UnitMessage::Catch(err)) => {
                            let _ = result.send(Err(TaskError::Failed(err)));
                            if self.options.terminate_on_error {
                                run_flag = false;
                                exit = ExitReason::TaskFailed;
                            }
                            break;
                        }
                        Ok(UnitMessage::Event(event)) => (self.on_event)(event),
                        Ok(UnitMessage::Terminate(reason)) => {
                            info!(member = self.id, task_id, %reason, "unit requested retirement");
                            run_flag = false;
                        }
                        Ok(UnitMessage::Ack(_)) => {}
                        Err(_) => {
                            let _ = result.send(Err(TaskError::UnitCrashed));
                            return ExitReason::Crashed;
                        }
                    },
                    recv(self.control) -> ctl => match ctl {
                        Ok(Control::Stop) => run_flag = false,
                        Ok(Control::Kill) | Err(_) => {
                            let _ = result.send(Err(TaskError::Terminated));
                            return ExitReason::Killed;
                        }
                    },
                }
            }
        }

        exit
    }

    /// Wait for a task or a control message, whichever comes first.
    fn claim(&self) -> Claim<WorkerTask<W>> {
        let take = self.queue.take();
        select! {
            recv(take.receiver()) -> msg => match msg {
                Ok(task) => Claim::Task(task),
                Err(_) => {
                    // Queue was cleared under us; a pending kill wins.
                    match self.control.try_recv() {
                        Ok(Control::Kill) | Err(crossbeam::channel::TryRecvError::Disconnected) => Claim::Stop(ExitReason::Killed),
                        Ok(Control::Stop) => Claim::Stop(ExitReason::Requested),
                        Err(crossbeam::channel::TryRecvError::Empty) => Claim::Cleared,
                    }
                }
            },
            recv(self.control) -> ctl => {
                let kill = !matches!(ctl, Ok(Control::Stop));
                if let Some(task) = take.cancel() {
                    if kill {
                        task.reject(TaskError::Terminated);
                    } else {
                        self.queue.put_front(task);
                    }
                }
                Claim::Stop(if kill { ExitReason::Killed } else { ExitReason::Requested })
            },
        }
    }
}
