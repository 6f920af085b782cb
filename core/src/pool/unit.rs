//! pool/unit.rs
//! Execution unit: an isolated OS thread that owns one [`Worker`] and talks to
//! its supervisor only through channels.
//!
//! Protocol (closed sum types, matched exhaustively on both sides):
//! - supervisor → unit: [`UnitRequest::Probe`], [`UnitRequest::Run`]
//! - unit → supervisor: [`UnitMessage`] (ack, return, catch, event, terminate)
//!
//! The worker's setup runs on the first probe; a unit that never answers the
//! probe within the handshake bound is a configuration error.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::pool::types::UnitError;

/// Entry point run by an execution unit, one input per task.
pub trait Worker: Send + Sized + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;
    type Error: Send + 'static;
    type Event: Send + 'static;

    /// Runs once on the unit thread, before the first probe is acknowledged.
    fn setup(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn run(
        &mut self,
        input: Self::Input,
        ctx: &UnitContext<Self>,
    ) -> Result<Self::Output, Self::Error>;
}

pub(crate) enum UnitRequest<I> {
    Probe,
    Run(I),
}

pub(crate) enum UnitMessage<W: Worker> {
    Ack(Result<(), String>),
    Return(W::Output),
    Catch(W::Error),
    Event(W::Event),
    /// The unit asks to be retired once the current task completes.
    Terminate(String),
}

/// Handle given to [`Worker::run`] for talking back to the supervisor.
pub struct UnitContext<W: Worker> {
    tx: Sender<UnitMessage<W>>,
}

impl<W: Worker> UnitContext<W> {
    /// Forward an event to the pool's event handler.
    pub fn emit(&self, event: W::Event) {
        let _ = self.tx.send(UnitMessage::Event(event));
    }

    /// Ask the owner to retire this unit after the current task.
    pub fn request_terminate(&self, reason: impl Into<String>) {
        let _ = self.tx.send(UnitMessage::Terminate(reason.into()));
    }
}

pub struct ExecutionUnit<W: Worker> {
    name: String,
    requests: Option<Sender<UnitRequest<W::Input>>>,
    messages: Receiver<UnitMessage<W>>,
    join: Option<JoinHandle<()>>,
    acknowledged: bool,
}

impl<W: Worker> ExecutionUnit<W> {
    /// Move `worker` onto a fresh OS thread.
    pub fn spawn(name: String, worker: W) -> Result<Self, UnitError> {
        let (req_tx, req_rx) = unbounded::<UnitRequest<W::Input>>();
        let (msg_tx, msg_rx) = unbounded::<UnitMessage<W>>();

        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || unit_main(worker, req_rx, msg_tx))?;

        Ok(Self {
            name,
            requests: Some(req_tx),
            messages: msg_rx,
            join: Some(join),
            acknowledged: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Liveness handshake. Idempotent once acknowledged.
    pub fn probe(&mut self, timeout: Duration) -> Result<(), UnitError> {
        if self.acknowledged {
            return Ok(());
        }
        self.send(UnitRequest::Probe)?;
        loop {
            match self.messages.recv_timeout(timeout) {
                Ok(UnitMessage::Ack(Ok(()))) => {
                    self.acknowledged = true;
                    return Ok(());
                }
                Ok(UnitMessage::Ack(Err(msg))) => return Err(UnitError::Setup(msg)),
                // Nothing else is in flight before the first ack.
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => return Err(UnitError::HandshakeTimeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(UnitError::Disconnected),
            }
        }
    }

    /// Move a task payload into the unit.
    pub(crate) fn dispatch(&self, input: W::Input) -> Result<(), UnitError> {
        self.send(UnitRequest::Run(input))
    }

    pub(crate) fn messages(&self) -> &Receiver<UnitMessage<W>> {
        &self.messages
    }

    fn send(&self, request: UnitRequest<W::Input>) -> Result<(), UnitError> {
        match &self.requests {
            Some(tx) => tx.send(request).map_err(|_| UnitError::Disconnected),
            None => Err(UnitError::Disconnected),
        }
    }

    /// Close the request channel and wait for the idle unit to exit.
    pub fn shutdown(mut self) {
        self.requests = None;
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!(unit = %self.name, "execution unit panicked during shutdown");
            }
        }
    }

    /// Close the request channel without waiting. A busy unit finishes its
    /// current run, fails to deliver the reply, and exits.
    pub fn dispose(mut self) {
        self.requests = None;
        self.join = None;
        debug!(unit = %self.name, "execution unit disposed");
    }
}

fn unit_main<W: Worker>(
    mut worker: W,
    requests: Receiver<UnitRequest<W::Input>>,
    messages: Sender<UnitMessage<W>>,
) {
    let ctx = UnitContext { tx: messages.clone() };
    let mut ready = false;

    while let Ok(request) = requests.recv() {
        let reply = match request {
            UnitRequest::Probe => {
                let res = if ready { Ok(()) } else { worker.setup() };
                ready = res.is_ok();
                UnitMessage::Ack(res)
            }
            UnitRequest::Run(input) => match worker.run(input, &ctx) {
                Ok(out) => UnitMessage::Return(out),
                Err(err) => UnitMessage::Catch(err),
            },
        };
        if messages.send(reply).is_err() {
            break;
        }
    }
}
