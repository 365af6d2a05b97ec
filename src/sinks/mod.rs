//! Sink implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod memory;

#[cfg(feature = "console")]
pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use file::FileSink;
pub use memory::MemorySink;

pub use crate::core::Sink;

use crate::core::Record;
use crate::pattern::CompiledPattern;
use crate::text::{GrowableBuffer, DEFAULT_INLINE_CAPACITY};

/// Buffer one formatted line is rendered into.
pub type LineBuffer = GrowableBuffer<u8, DEFAULT_INLINE_CAPACITY>;

/// Render `record` with `pattern` if given, otherwise with the record's own.
pub(crate) fn render_line(record: &Record<'_>, pattern: Option<&CompiledPattern>) -> LineBuffer {
    let mut line = LineBuffer::new();
    match pattern {
        Some(pattern) => pattern.format(&mut line, record),
        None => record.format_into(&mut line),
    }
    line
}

fn compile_override(template: &str) -> crate::core::Result<CompiledPattern> {
    Ok(CompiledPattern::compile(template)?)
}
