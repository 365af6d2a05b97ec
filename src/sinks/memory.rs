//! In-memory sink

use super::{compile_override, render_line};
use crate::core::{Record, Result, Sink};
use crate::pattern::CompiledPattern;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Keeps every rendered line in memory.
///
/// Useful for tests and for embedding a log view in an application.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    pattern: Option<CompiledPattern>,
    flushes: AtomicU64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render with `template` instead of the logger's pattern.
    pub fn with_pattern(template: &str) -> Result<Self> {
        Ok(Self {
            pattern: Some(compile_override(template)?),
            ..Self::default()
        })
    }

    /// Copy of the lines captured so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Remove and return the captured lines.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl Sink for MemorySink {
    fn message(&self, record: &Record<'_>) {
        let line = render_line(record, self.pattern.as_ref());
        let line = String::from_utf8_lossy(line.as_slice()).into_owned();
        self.lines.lock().push(line);
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &str {
        "memory"
    }
}
