//! pool/mod.rs
//! Worker pool: blocking queue, execution units, supervised threads, and the
//! reconciling pool that owns them.

pub mod types;
pub mod queue;
pub mod handle;
pub mod unit;
pub mod thread;
pub mod thread_pool;

pub use types::*;
pub use queue::{BlockingQueue, Take};
pub use handle::TaskHandle;
pub use unit::{ExecutionUnit, UnitContext, Worker};
pub use thread::{EventHandler, ExitSignal, Thread};
pub use thread_pool::{ThreadPool, WorkerFactory};
