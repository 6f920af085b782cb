use std::time::Duration;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_POOL_SIZE};

/// Lifecycle of a supervised thread.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, Serialize)]
pub enum ThreadStatus {
    New        = 0,
    Blocked    = 1,
    Running    = 2,
    Terminated = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolStatus {
    Enabled,
    Disabled,
}

/// Why a thread's control loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Graceful stop: requested by the pool or by the unit itself.
    Requested,
    /// Task failure with `terminate_on_error` set.
    TaskFailed,
    /// Hard termination.
    Killed,
    /// Handshake timeout or setup failure.
    Fatal(String),
    /// The execution unit went away mid-task.
    Crashed,
}

impl ExitReason {
    pub fn is_abnormal(&self) -> bool {
        matches!(self, ExitReason::Fatal(_) | ExitReason::Crashed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Prefix for OS thread names and log fields.
    pub name: String,
    pub target_size: usize,
    pub terminate_on_error: bool,
    pub handshake_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".into(),
            target_size: DEFAULT_POOL_SIZE,
            terminate_on_error: true,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
        }
    }
}

impl PoolConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue was cleared while waiting")]
    Cleared,
}

#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("execution unit did not acknowledge probe within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("execution unit setup failed: {0}")]
    Setup(String),
    #[error("execution unit is gone")]
    Disconnected,
    #[error("failed to spawn execution unit: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Outcome of a task that did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum TaskError<E> {
    /// The worker returned an error.
    #[error("task failed: {0}")]
    Failed(E),
    /// Liveness handshake failed before the task could run.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("execution unit crashed while running the task")]
    UnitCrashed,
    #[error("thread terminated before the task completed")]
    Terminated,
    /// Task was discarded by `clear`/`shutdown` before any thread claimed it.
    #[error("task dropped before it was run")]
    Dropped,
}

impl<E> TaskError<E> {
    pub fn worker_error(&self) -> Option<&E> {
        match self {
            TaskError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<UnitError> for TaskError<E> {
    fn from(e: UnitError) -> Self {
        match e {
            UnitError::Disconnected => TaskError::UnitCrashed,
            other => TaskError::Configuration(other.to_string()),
        }
    }
}
