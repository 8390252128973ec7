//! Subscriber setup for the crate's `tracing` events.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

use crate::error::OrmError;

/// Writer that tees every line to stdout and, when opened with a path, a log file.
#[derive(Clone)]
pub struct LogWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl LogWriter {
    /// # Errors
    /// Returns the io error when the log file cannot be created.
    pub fn new(path: Option<&Path>) -> io::Result<Self> {
        let file = match path {
            Some(path) => Some(Arc::new(Mutex::new(File::create(path)?))),
            None => None,
        };
        Ok(Self { file })
    }
}

pub struct LogWriterGuard {
    file: Option<Arc<Mutex<File>>>,
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriterGuard {
            file: self.file.clone(),
        }
    }
}

impl LogWriterGuard {
    fn with_file(&self, op: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let mut handle = file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        op(&mut handle)
    }
}

impl Write for LogWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.with_file(|file| file.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.with_file(Write::flush)
    }
}

/// Install a human-readable global subscriber at `level`, teeing to `log_file` when given.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` if the file cannot be created or a global subscriber
/// is already installed.
pub fn init(level: Level, log_file: Option<&Path>) -> Result<(), OrmError> {
    let writer = LogWriter::new(log_file)?;
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| OrmError::ConfigurationError(format!("could not install logger: {e}")))
}

/// Install a global subscriber that writes one JSON object per event to `writer`.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` if a global subscriber is already installed.
pub fn init_json<W>(level: Level, writer: W) -> Result<(), OrmError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_max_level(level)
        .try_init()
        .map_err(|e| OrmError::ConfigurationError(format!("could not install logger: {e}")))
}
