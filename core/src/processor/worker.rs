//! processor/worker.rs
//! Pool worker that runs one file through the pipeline per task.

use std::sync::Arc;

use tracing::{info, warn};

use crate::crypto::SecretKey;
use crate::io::{InputSource, OutputSink};
use crate::pool::{UnitContext, Worker};
use crate::processor::pipeline::process_file;
use crate::processor::types::{FileFailure, FileOutcome, ProcessInfo, ProcessStatus, ProcessorConfig};

/// Everything a worker needs for one file. Moved into the unit.
pub struct FileJob {
    pub task_id: u64,
    pub input: InputSource,
    pub key: SecretKey,
    pub sink: OutputSink,
}

pub struct FileWorker {
    config: Arc<ProcessorConfig>,
    bytes_processed: u64,
}

impl FileWorker {
    pub fn new(config: Arc<ProcessorConfig>) -> Self {
        Self { config, bytes_processed: 0 }
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }
}

impl Worker for FileWorker {
    type Input = FileJob;
    type Output = FileOutcome;
    type Error = FileFailure;
    type Event = ProcessInfo;

    fn run(&mut self, job: FileJob, ctx: &UnitContext<Self>) -> Result<FileOutcome, FileFailure> {
        let FileJob { task_id, input, key, sink } = job;
        let base = ProcessInfo::waiting(task_id, input.name());

        let mut report = |progress: u8| ctx.emit(base.with_status(ProcessStatus::Processing, progress));
        let result = process_file(&self.config, &input, &key, sink, &mut report);

        match result {
            Ok(output) => {
                self.bytes_processed += output.bytes_in;
                let info = ProcessInfo {
                    output_name: output.output_name,
                    ..base.with_status(ProcessStatus::Success, 100)
                };
                info!(
                    task_id,
                    input = %info.input_name,
                    output = %info.output_name,
                    bytes = output.bytes_in,
                    "file processed"
                );
                ctx.emit(info.clone());

                if let Some(limit) = self.config.recycle_after_bytes {
                    if self.bytes_processed >= limit {
                        ctx.request_terminate(format!("processed {} bytes", self.bytes_processed));
                    }
                }
                Ok(FileOutcome { info, telemetry: output.telemetry })
            }
            Err(error) => {
                let info = base.with_status(error.fail_status(), 0);
                warn!(task_id, input = %info.input_name, status = ?info.status, %error, "file failed");
                ctx.emit(info.clone());
                Err(FileFailure { info, error })
            }
        }
    }
}
