//! # Pattern Sink Logger
//!
//! An embeddable logging front end built around two pieces:
//!
//! - **Patterns**: a template such as `"[{time}] {level:<7} {category} - {message}"`
//!   is compiled once into segments and replayed against every record, with
//!   codepoint-aware width, alignment and fill.
//! - **Hierarchies**: loggers form a tree. Destinations added to a logger are
//!   inherited by its descendants, which can add their own or disable
//!   inherited ones. Each logger keeps its effective destination set cached,
//!   so a call only reads one precomputed map.
//!
//! Calls below a logger's level cost a single atomic load; the message is
//! produced at most once, and only when a destination reads it.
//!
//! ## Example
//!
//! ```
//! use pattern_sink_logger::prelude::*;
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemorySink::new());
//! let root = Logger::new("app");
//! root.set_pattern("{category:<5}|{level:^9}|{message}").unwrap();
//! root.add_sink(&SinkHandle::shared(Arc::clone(&memory)));
//!
//! let db = root.child("db");
//! db.info("connected");
//! assert_eq!(memory.lines(), vec!["db   |  INFO   |connected"]);
//! ```

pub mod core;
pub mod macros;
pub mod pattern;
pub mod sinks;
pub mod text;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
    pub use crate::sinks::MemorySink;
    pub use crate::core::{
        LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
        MultiThreaded, Record, Result, SingleThreaded, Sink, SinkHandle, SourceLocation,
    };
    pub use crate::pattern::CompiledPattern;
}

pub use crate::core::{
    LevelFilter, LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
    MultiThreaded, NodeId, PatternError, Record, Result, SingleThreaded, Sink, SinkHandle, SinkId,
    SourceLocation, SyncPolicy, Timestamp, TimestampFormat,
};
pub use crate::pattern::{CompiledPattern, DEFAULT_PATTERN};
pub use crate::sinks::MemorySink;
#[cfg(feature = "console")]
pub use crate::sinks::ConsoleSink;
#[cfg(feature = "file")]
pub use crate::sinks::FileSink;
