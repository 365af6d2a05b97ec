//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. They check the
//! logger's level first: when the level is filtered out, the format
//! arguments are never evaluated. The call site's file and line are captured
//! for the `{file}` and `{line}` placeholders. Stable Rust has no macro for the
//! enclosing function's name, so `{function}` renders the call site's module
//! path (`module_path!()`).
//!
//! # Examples
//!
//! ```
//! use pattern_sink_logger::prelude::*;
//! use pattern_sink_logger::info;
//!
//! let logger = Logger::new("server");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use pattern_sink_logger::prelude::*;
/// # let logger = Logger::new("app");
/// use pattern_sink_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::LogLevel = $level;
        if logger.enabled(level) {
            logger.log_fmt(
                level,
                $crate::SourceLocation::new(file!(), module_path!(), line!()),
                format_args!($($arg)+),
            );
        } else {
            logger.metrics().record_filtered();
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use pattern_sink_logger::prelude::*;
/// # let logger = Logger::new("app");
/// # logger.set_level(LogLevel::Trace);
/// use pattern_sink_logger::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use pattern_sink_logger::prelude::*;
/// # let logger = Logger::new("app");
/// use pattern_sink_logger::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
