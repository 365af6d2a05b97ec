//! File sink implementation

use super::{compile_override, render_line};
use crate::core::{Record, Result, Sink};
use crate::pattern::CompiledPattern;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Appends one line per record to a file, buffered.
///
/// Write errors are counted, and the first one is reported on stderr; the
/// sink keeps trying on later records.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    pattern: Option<CompiledPattern>,
    write_errors: AtomicU64,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            pattern: None,
            write_errors: AtomicU64::new(0),
        })
    }

    /// Render with `template` instead of the logger's pattern
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pattern_sink_logger::sinks::FileSink;
    ///
    /// let sink = FileSink::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_pattern("{time:iso8601} [{level}] {message}")
    ///     .unwrap();
    /// ```
    pub fn with_pattern(mut self, template: &str) -> Result<Self> {
        self.pattern = Some(compile_override(template)?);
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of failed writes and flushes so far
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    fn report(&self, action: &str, error: io::Error) {
        if self.write_errors.fetch_add(1, Ordering::Relaxed) == 0 {
            eprintln!(
                "[LOGGER ERROR] File sink {} {} failed: {}",
                self.path.display(),
                action,
                error
            );
        }
    }
}

impl Sink for FileSink {
    fn message(&self, record: &Record<'_>) {
        let mut line = render_line(record, self.pattern.as_ref());
        line.push_back(b'\n');

        let result = self.writer.lock().write_all(line.as_slice());
        if let Err(e) = result {
            self.report("write", e);
        }
    }

    fn flush(&self) {
        let result = self.writer.lock().flush();
        if let Err(e) = result {
            self.report("flush", e);
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Last chance for buffered lines; errors have nowhere to go.
        let _ = self.writer.get_mut().flush();
    }
}
