//! Replaying a compiled pattern against a record

use super::compiler::{CompiledPattern, Segment};
use super::spec::{NumericSpec, StringSpec};
use crate::core::record::Record;
use crate::text::{CachedStr, CodeUnit, GrowableBuffer};

impl CompiledPattern {
    /// Render `record` into `buf`, appending to whatever it already holds.
    ///
    /// String values are transcoded to the buffer's encoding as they are
    /// appended. Never fails.
    pub fn format<T: CodeUnit, const N: usize>(
        &self,
        buf: &mut GrowableBuffer<T, N>,
        record: &Record<'_>,
    ) {
        for segment in self.segments() {
            match segment {
                Segment::Literal(range) => buf.append_str(self.literal(range)),
                Segment::Category(spec) => write_text(buf, record.category(), spec),
                Segment::Level(spec) => write_text(buf, record.level_name(), spec),
                Segment::File(spec) => {
                    write_text(buf, &CachedStr::new(record.location().file), spec)
                }
                Segment::Function(spec) => {
                    write_text(buf, &CachedStr::new(record.location().function), spec)
                }
                Segment::Message(spec) => write_text(buf, &record.message(), spec),
                Segment::Line(spec) => write_number(buf, spec, u64::from(record.location().line)),
                Segment::Thread(spec) => write_number(buf, spec, record.thread_id()),
                Segment::Msec(spec) => write_number(buf, spec, u64::from(record.timestamp().millis())),
                Segment::Usec(spec) => write_number(buf, spec, u64::from(record.timestamp().micros())),
                Segment::Nsec(spec) => write_number(buf, spec, u64::from(record.timestamp().nanos)),
                Segment::Time(format) => {
                    // Writing into a GrowableBuffer cannot fail.
                    let _ = format.write(buf, record.timestamp());
                }
            }
        }
    }
}

fn write_number<T: CodeUnit, const N: usize>(
    buf: &mut GrowableBuffer<T, N>,
    spec: &NumericSpec,
    value: u64,
) {
    let _ = spec.write(buf, value);
}

fn write_text<T: CodeUnit, const N: usize>(
    buf: &mut GrowableBuffer<T, N>,
    value: &CachedStr<'_>,
    spec: &StringSpec,
) {
    if spec.width == 0 {
        buf.append_str(value);
        return;
    }

    let padding = spec.width.saturating_sub(value.codepoints());
    if padding == 0 {
        buf.append_str(value);
        return;
    }

    let (left, right) = spec.align.split(padding);
    let fill = spec.fill.as_str();
    let fill_units = T::encoded_len(fill);

    // One reservation up front; nothing below reallocates.
    buf.reserve(buf.len() + T::encoded_len(value) + padding * fill_units);
    write_fill(buf, fill, fill_units, left);
    buf.append_str(value);
    write_fill(buf, fill, fill_units, right);
}

/// Write `fill` `count` times by writing it once and then doubling the
/// written run until it is long enough.
fn write_fill<T: CodeUnit, const N: usize>(
    buf: &mut GrowableBuffer<T, N>,
    fill: &str,
    fill_units: usize,
    count: usize,
) {
    if count == 0 || fill_units == 0 {
        return;
    }

    let start = buf.len();
    let total = fill_units * count;
    buf.append_str(fill);
    loop {
        let written = buf.len() - start;
        if written >= total {
            break;
        }
        buf.extend_from_within(start..start + written.min(total - written));
    }
}
