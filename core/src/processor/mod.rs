//! processor/mod.rs
//! File-level orchestration: classify each input, seal or open it on a
//! worker, report progress.

pub mod types;
pub mod progress;
pub mod pipeline;
pub mod worker;
pub mod file_processor;

pub use types::*;
pub use progress::{Phase, WeightedProgress};
pub use pipeline::{is_container, open_container, process_file, seal_file, PipelineOutput};
pub use worker::{FileJob, FileWorker};
pub use file_processor::{ProcessCallback, ProcessHandle, SecureFileProcessor};
