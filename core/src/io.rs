//! io.rs
//! Normalized inputs and outputs for the file pipeline.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::chunk::ChunkSource;
use crate::types::StreamError;

/// Where a file's bytes come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    File(PathBuf),
    Memory { name: String, data: Bytes },
}

impl InputSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        InputSource::File(path.into())
    }

    pub fn memory(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        InputSource::Memory { name: name.into(), data: data.into() }
    }

    /// Display name used for classification and the output name.
    pub fn name(&self) -> String {
        match self {
            InputSource::File(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            InputSource::Memory { name, .. } => name.clone(),
        }
    }

    /// Random-access view over the input bytes.
    pub fn open(&self) -> Result<Box<dyn ChunkSource + Send>, StreamError> {
        let source: Box<dyn ChunkSource + Send> = match self {
            InputSource::File(p) => Box::new(fs::File::open(p)?),
            InputSource::Memory { data, .. } => Box::new(data.clone()),
        };
        Ok(source)
    }
}

/// Where a file's output bytes go.
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    /// Written as `<dir>/<output name>`.
    Directory(PathBuf),
    Memory(SharedBuffer),
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputSink::Writer(_) => f.write_str("Writer(..)"),
            OutputSink::File(p) => f.debug_tuple("File").field(p).finish(),
            OutputSink::Directory(p) => f.debug_tuple("Directory").field(p).finish(),
            OutputSink::Memory(b) => f.debug_tuple("Memory").field(&b.len()).finish(),
        }
    }
}

/// Open `sink` for writing. `output_name` is only consulted for
/// `Directory`, and only its final path component is used.
pub fn open_output(sink: OutputSink, output_name: &str) -> Result<Box<dyn Write + Send>, StreamError> {
    match sink {
        OutputSink::Writer(w) => Ok(w),
        OutputSink::File(p) => Ok(Box::new(io::BufWriter::new(fs::File::create(p)?))),
        OutputSink::Directory(dir) => {
            let file_name = Path::new(output_name)
                .file_name()
                .ok_or_else(|| StreamError::Validation(format!("unusable output name {:?}", output_name)))?;
            fs::create_dir_all(&dir)?;
            Ok(Box::new(io::BufWriter::new(fs::File::create(dir.join(file_name))?)))
        }
        OutputSink::Memory(buf) => Ok(Box::new(buf)),
    }
}

/// Growable in-memory sink that stays readable after the writer is dropped.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared buffer poisoned"))?;
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
