use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compression::{CompressionCodec, DEFLATE_LEVELS, ZSTD_LEVELS};
use crate::constants::{
    CONTAINER_EXTENSION, DEFAULT_CIPHER_CHUNK_SIZE, DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_POOL_SIZE,
    DEFAULT_READ_CHUNK_SIZE, MAX_CHUNK_SIZE,
};
use crate::crypto::CipherSuite;
use crate::pool::UnitError;
use crate::telemetry::TelemetrySnapshot;
use crate::types::StreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Waiting,
    Processing,
    Success,
    FailFileNotAllowed,
    FailWrongKey,
}

impl ProcessStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessStatus::Waiting | ProcessStatus::Processing)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ProcessStatus::FailFileNotAllowed | ProcessStatus::FailWrongKey)
    }
}

/// Progress event for one submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: u64,
    pub input_name: String,
    /// Empty until the file succeeds.
    pub output_name: String,
    pub status: ProcessStatus,
    /// 0..=100
    pub progress: u8,
}

impl ProcessInfo {
    pub fn waiting(id: u64, input_name: impl Into<String>) -> Self {
        Self {
            id,
            input_name: input_name.into(),
            output_name: String::new(),
            status: ProcessStatus::Waiting,
            progress: 0,
        }
    }

    pub(crate) fn with_status(&self, status: ProcessStatus, progress: u8) -> Self {
        Self { status, progress, ..self.clone() }
    }
}

/// Successful result of one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub info: ProcessInfo,
    pub telemetry: TelemetrySnapshot,
}

/// Failed result of one file: the terminal event plus the cause.
#[derive(Debug)]
pub struct FileFailure {
    pub info: ProcessInfo,
    pub error: StreamError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}): {}", self.info.input_name, self.info.status, self.error)
    }
}

impl std::error::Error for FileFailure {}

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] UnitError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub pool_size: usize,
    /// Plaintext granularity when reading a plain file and when writing an
    /// opened one.
    pub read_chunk_size: usize,
    /// Compressed bytes per sealed chunk.
    pub cipher_chunk_size: usize,
    pub codec: CompressionCodec,
    /// Codec default when unset.
    pub compression_level: Option<i32>,
    pub cipher_suite: CipherSuite,
    /// Inputs with this extension are opened, everything else is sealed.
    pub container_extension: String,
    /// A worker retires after processing this many input bytes.
    pub recycle_after_bytes: Option<u64>,
    pub handshake_timeout_ms: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE.min(num_cpus::get().max(1)),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            cipher_chunk_size: DEFAULT_CIPHER_CHUNK_SIZE,
            codec: CompressionCodec::default(),
            compression_level: None,
            cipher_suite: CipherSuite::default(),
            container_extension: CONTAINER_EXTENSION.into(),
            recycle_after_bytes: None,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
        }
    }
}

impl ProcessorConfig {
    /// Parse and validate; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ProcessorError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProcessorError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ProcessorError> {
        let invalid = |msg: String| Err(ProcessorError::InvalidConfig(msg));

        if self.pool_size == 0 {
            return invalid("pool_size must be at least 1".into());
        }
        for (field, size) in [("read_chunk_size", self.read_chunk_size), ("cipher_chunk_size", self.cipher_chunk_size)] {
            if size == 0 || size > MAX_CHUNK_SIZE {
                return invalid(format!("{} must be in 1..={}, got {}", field, MAX_CHUNK_SIZE, size));
            }
        }
        if let Some(level) = self.compression_level {
            let range = match self.codec {
                CompressionCodec::Deflate => DEFLATE_LEVELS,
                CompressionCodec::Zstd => ZSTD_LEVELS,
            };
            if !range.contains(&level) {
                return invalid(format!("{} level {} outside {:?}", self.codec.name(), level, range));
            }
        }
        let ext = self.container_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return invalid(format!("unusable container extension {:?}", self.container_extension));
        }
        Ok(())
    }
}
