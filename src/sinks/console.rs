//! Console sink implementation

use super::{compile_override, render_line};
use crate::core::{LogLevel, Record, Result, Sink};
use crate::pattern::CompiledPattern;
use colored::Colorize;
use std::io::{self, Write};

/// Writes one line per record: `Error` and `Fatal` to stderr, the rest to stdout.
pub struct ConsoleSink {
    use_colors: bool,
    pattern: Option<CompiledPattern>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            pattern: None,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            pattern: None,
        }
    }

    /// Render with `template` instead of the logger's pattern
    ///
    /// # Example
    ///
    /// ```
    /// use pattern_sink_logger::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::new()
    ///     .with_pattern("{time:rfc3339} {level:>7} {message}")
    ///     .unwrap();
    /// ```
    pub fn with_pattern(mut self, template: &str) -> Result<Self> {
        self.pattern = Some(compile_override(template)?);
        Ok(self)
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn message(&self, record: &Record<'_>) {
        let line = render_line(record, self.pattern.as_ref());
        let text = String::from_utf8_lossy(line.as_slice());
        let level = record.level();

        // Route Error and Fatal levels to stderr, others to stdout.
        // A failing console has nowhere left to report to.
        let _ = match level {
            LogLevel::Error | LogLevel::Fatal => {
                write_line(&mut io::stderr().lock(), &text, level, self.use_colors)
            }
            _ => write_line(&mut io::stdout().lock(), &text, level, self.use_colors),
        };
    }

    fn flush(&self) {
        // Records go to either stream.
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }

    fn name(&self) -> &str {
        "console"
    }
}

fn write_line(out: &mut dyn Write, text: &str, level: LogLevel, use_colors: bool) -> io::Result<()> {
    if use_colors {
        writeln!(out, "{}", text.color(level.color_code()))
    } else {
        writeln!(out, "{}", text)
    }
}
