use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::pool::types::TaskError;

pub(crate) type TaskResult<O, E> = Result<O, TaskError<E>>;

/// Queued unit of work. Dropping it unresolved settles the handle with
/// [`TaskError::Dropped`].
pub(crate) struct Task<I, O, E> {
    pub id: u64,
    pub payload: I,
    pub result: oneshot::Sender<TaskResult<O, E>>,
}

impl<I, O, E> Task<I, O, E> {
    pub fn new(id: u64, payload: I) -> (Self, TaskHandle<O, E>) {
        let (tx, rx) = oneshot::channel();
        (Self { id, payload, result: tx }, TaskHandle { id, rx })
    }

    pub fn reject(self, err: TaskError<E>) {
        let _ = self.result.send(Err(err));
    }
}

/// Single-resolution result of a submitted task.
///
/// Await it from async code or call [`TaskHandle::wait`] to block.
#[must_use = "a task handle does nothing unless awaited or waited on"]
pub struct TaskHandle<O, E> {
    id: u64,
    rx: oneshot::Receiver<TaskResult<O, E>>,
}

impl<O, E> TaskHandle<O, E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Block the calling thread until the task settles.
    pub fn wait(self) -> Result<O, TaskError<E>> {
        futures::executor::block_on(self)
    }

    /// Non-blocking poll; `None` while the task is still pending.
    pub fn try_result(&mut self) -> Option<Result<O, TaskError<E>>> {
        match self.rx.try_recv() {
            Ok(Some(res)) => Some(res),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(TaskError::Dropped)),
        }
    }
}

impl<O, E> Future for TaskHandle<O, E> {
    type Output = Result<O, TaskError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(TaskError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}
