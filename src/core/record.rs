//! Per-call log record
//!
//! A [`Record`] lives on the stack for the duration of one dispatch and is
//! handed by reference to every destination. The message payload is kept
//! unevaluated until a destination asks for it: the first [`Record::message`]
//! call runs the producer into the record's own buffer, later calls reuse it.

use super::log_level::LogLevel;
use super::sink_tree::panic_message;
use super::timestamp::Timestamp;
use crate::pattern::CompiledPattern;
use crate::text::{CachedStr, CodeUnit, GrowableBuffer};
use std::cell::OnceCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Inline capacity of the buffer a lazily produced message is rendered into.
pub const MESSAGE_INLINE_CAPACITY: usize = 256;

/// Writes a message into the sink it is given.
pub type Producer<'a> = &'a dyn Fn(&mut dyn fmt::Write) -> fmt::Result;

type MessageBuffer = GrowableBuffer<u8, MESSAGE_INLINE_CAPACITY>;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

// Small sequential ids are cheaper to render than `ThreadId`'s Debug output.
thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Id of the calling thread, stable for the thread's lifetime.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Where a log call was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    /// Rendered by `{function}`. The logging macros fill it with the call
    /// site's module path.
    pub function: &'static str,
    pub line: u32,
}

impl SourceLocation {
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }
}

enum Payload<'a> {
    Text(&'a str),
    Args(fmt::Arguments<'a>),
    Producer(Producer<'a>),
}

/// Everything needed to render one log line.
pub struct Record<'a> {
    level: LogLevel,
    level_name: CachedStr<'a>,
    category: CachedStr<'a>,
    location: SourceLocation,
    thread_id: u64,
    timestamp: Timestamp,
    pattern: Option<&'a CompiledPattern>,
    payload: Payload<'a>,
    rendered: OnceCell<MessageBuffer>,
    message_codepoints: OnceLock<usize>,
}

impl<'a> Record<'a> {
    /// A record whose message is already text.
    pub fn new(level: LogLevel, message: &'a str) -> Self {
        Self::with_payload(level, Payload::Text(message))
    }

    /// A record whose message is rendered from `args` on first use.
    pub fn from_args(level: LogLevel, args: fmt::Arguments<'a>) -> Self {
        Self::with_payload(level, Payload::Args(args))
    }

    /// A record whose message is written by `producer` on first use.
    ///
    /// The producer runs at most once, however many destinations read the message.
    pub fn from_producer(level: LogLevel, producer: Producer<'a>) -> Self {
        Self::with_payload(level, Payload::Producer(producer))
    }

    fn with_payload(level: LogLevel, payload: Payload<'a>) -> Self {
        Self {
            level,
            level_name: CachedStr::new(level.to_str()),
            category: CachedStr::new(""),
            location: SourceLocation::default(),
            thread_id: current_thread_id(),
            timestamp: Timestamp::now(),
            pattern: None,
            payload,
            rendered: OnceCell::new(),
            message_codepoints: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<CachedStr<'a>>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_level_name(mut self, name: impl Into<CachedStr<'a>>) -> Self {
        self.level_name = name.into();
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_thread_id(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Pattern used by [`Record::format_into`]; normally the dispatching logger's.
    #[must_use]
    pub fn with_pattern(mut self, pattern: &'a CompiledPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline]
    pub fn level_name(&self) -> &CachedStr<'a> {
        &self.level_name
    }

    #[inline]
    pub fn category(&self) -> &CachedStr<'a> {
        &self.category
    }

    #[inline]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    #[inline]
    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    #[inline]
    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    #[inline]
    pub fn pattern(&self) -> Option<&'a CompiledPattern> {
        self.pattern
    }

    /// The message text, producing it on the first call.
    pub fn message(&self) -> CachedStr<'_> {
        let text: &str = match &self.payload {
            Payload::Text(text) => text,
            Payload::Args(args) => match args.as_str() {
                Some(text) => text,
                None => self.materialize(|out| out.write_fmt(*args)),
            },
            Payload::Producer(producer) => self.materialize(*producer),
        };
        CachedStr::with_shared_count(text, &self.message_codepoints)
    }

    /// `true` once a deferred message has been produced.
    pub fn is_materialized(&self) -> bool {
        self.rendered.get().is_some()
    }

    /// Render this record with its pattern, or just its message if it has none.
    pub fn format_into<T: CodeUnit, const N: usize>(&self, buf: &mut GrowableBuffer<T, N>) {
        match self.pattern {
            Some(pattern) => pattern.format(buf, self),
            None => buf.append_str(self.message().as_str()),
        }
    }

    fn materialize<F>(&self, produce: F) -> &str
    where
        F: FnOnce(&mut dyn fmt::Write) -> fmt::Result,
    {
        let buffer = self.rendered.get_or_init(|| {
            let mut buffer = MessageBuffer::new();
            // A failing or panicking producer keeps whatever it wrote first;
            // either way it has had its one attempt.
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| produce(&mut buffer)));
            if let Err(panic_info) = attempt {
                eprintln!(
                    "[LOGGER ERROR] Message producer panicked: {}. Keeping the partial message.",
                    panic_message(&*panic_info)
                );
            }
            buffer
        });
        // Only whole `&str` values are ever appended, so this cannot fail.
        std::str::from_utf8(buffer.as_slice()).unwrap_or_default()
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("level", &self.level)
            .field("category", &self.category)
            .field("location", &self.location)
            .field("thread_id", &self.thread_id)
            .field("timestamp", &self.timestamp)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
