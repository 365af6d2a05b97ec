//! Core logger types and traits

pub mod config;
pub mod error;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod sink_tree;
pub mod sync_policy;
pub mod timestamp;

pub use config::LoggerConfig;
pub use error::{LoggerError, PatternError, Result};
pub use log_level::{LevelFilter, LogLevel};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use record::{current_thread_id, Producer, Record, SourceLocation};
pub use sink::{Sink, SinkHandle, SinkId};
pub use sink_tree::{EffectiveEntry, EffectiveSinks, NodeId, SinkDriver, SinkTree};
pub use sync_policy::{LockCell, MultiThreaded, SingleThreaded, SyncPolicy};
pub use timestamp::{Timestamp, TimestampFormat};
