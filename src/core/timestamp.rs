//! Timestamp capture and formatting for the `{time}` placeholder
//!
//! A [`Timestamp`] is what a record carries: seconds and nanoseconds since the
//! Unix epoch. [`TimestampFormat`] is the precompiled sub-format of a `{time}`
//! placeholder and renders straight into any `fmt::Write` without an
//! intermediate `String`.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time of a log call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self::new(since.as_secs() as i64, since.subsec_nanos()),
            Err(before) => {
                let before = before.duration();
                if before.subsec_nanos() == 0 {
                    Self::new(-(before.as_secs() as i64), 0)
                } else {
                    Self::new(
                        -(before.as_secs() as i64) - 1,
                        1_000_000_000 - before.subsec_nanos(),
                    )
                }
            }
        }
    }

    #[inline]
    pub fn millis(&self) -> u32 {
        self.nanos / 1_000_000
    }

    #[inline]
    pub fn micros(&self) -> u32 {
        self.nanos / 1_000
    }

    /// `None` if the value is outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.secs, self.nanos)
    }
}

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use pattern_sink_logger::core::{Timestamp, TimestampFormat};
///
/// let format = TimestampFormat::parse("iso8601").unwrap();
/// let mut out = String::new();
/// format.write(&mut out, &Timestamp::new(0, 5_000_000)).unwrap();
/// assert_eq!(out, "1970-01-01T00:00:00.005Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45`, the default for a bare `{time}`
    #[default]
    DateTime,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format, validated when the pattern is compiled
    Custom(String),
}

impl TimestampFormat {
    /// Parse the sub-format text of a `{time:...}` placeholder.
    ///
    /// Named formats are matched first; anything else must be a strftime
    /// string chrono accepts. Returns `None` for an invalid strftime string.
    pub fn parse(spec: &str) -> Option<Self> {
        let format = match spec {
            "" => TimestampFormat::DateTime,
            "iso8601" => TimestampFormat::Iso8601,
            "iso8601_us" => TimestampFormat::Iso8601Micros,
            "rfc3339" => TimestampFormat::Rfc3339,
            "unix" => TimestampFormat::Unix,
            "unix_ms" => TimestampFormat::UnixMillis,
            "unix_us" => TimestampFormat::UnixMicros,
            custom => {
                if StrftimeItems::new(custom).any(|item| matches!(item, Item::Error)) {
                    return None;
                }
                TimestampFormat::Custom(custom.to_string())
            }
        };
        Some(format)
    }

    /// Render `timestamp` into `out`.
    pub fn write<W: fmt::Write + ?Sized>(&self, out: &mut W, timestamp: &Timestamp) -> fmt::Result {
        let items = match self {
            TimestampFormat::DateTime => "%Y-%m-%d %H:%M:%S",
            TimestampFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S%.3fZ",
            TimestampFormat::Iso8601Micros => "%Y-%m-%dT%H:%M:%S%.6fZ",
            TimestampFormat::Rfc3339 => "%Y-%m-%dT%H:%M:%S%:z",
            TimestampFormat::Custom(format_str) => format_str.as_str(),
            TimestampFormat::Unix => return write!(out, "{}", timestamp.secs),
            TimestampFormat::UnixMillis => {
                return write!(
                    out,
                    "{}",
                    timestamp.secs as i128 * 1_000 + timestamp.millis() as i128
                )
            }
            TimestampFormat::UnixMicros => {
                return write!(
                    out,
                    "{}",
                    timestamp.secs as i128 * 1_000_000 + timestamp.micros() as i128
                )
            }
        };

        match timestamp.to_datetime() {
            Some(datetime) => write!(out, "{}", datetime.format(items)),
            None => write!(out, "{}", timestamp.secs),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}
