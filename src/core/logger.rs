//! Main logger implementation
//!
//! A [`Logger`] is a named node in a logger hierarchy. It owns:
//!
//! - a level, checked before any record is built
//! - a compiled pattern and per-level display names, handed to destinations
//!   through the [`Record`]
//! - a [`SinkDriver`] node holding its own destinations and the effective set
//!   inherited from its ancestors

use super::{
    config::LoggerConfig,
    error::{LoggerError, Result},
    log_level::{LevelFilter, LogLevel},
    metrics::LoggerMetrics,
    record::{Record, SourceLocation},
    sink::{SinkHandle, SinkId},
    sink_tree::{NodeId, SinkDriver, SinkTree},
    sync_policy::{LockCell, MultiThreaded, SingleThreaded, SyncPolicy},
};
use crate::pattern::{CompiledPattern, LevelNames, DEFAULT_PATTERN};
use crate::text::CachedString;
use std::fmt;
use std::sync::Arc;

/// Pattern and level names, swapped as a unit on reconfiguration.
#[derive(Clone)]
struct Style {
    pattern: Arc<CompiledPattern>,
    level_names: Arc<LevelNames>,
}

impl Style {
    fn new(pattern: CompiledPattern, level_names: LevelNames) -> Self {
        Self {
            pattern: Arc::new(pattern),
            level_names: Arc::new(level_names),
        }
    }
}

pub struct Logger<P: SyncPolicy = MultiThreaded> {
    name: CachedString,
    driver: SinkDriver<P>,
    style: P::Cell<Style>,
    metrics: LoggerMetrics,
}

impl Logger {
    /// A root logger of a new thread-safe hierarchy, at level `Info` with
    /// [`DEFAULT_PATTERN`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name)
    }

    /// Create a builder for a root logger
    ///
    /// # Example
    /// ```
    /// use pattern_sink_logger::prelude::*;
    ///
    /// let memory = SinkHandle::new(MemorySink::new());
    /// let logger = Logger::builder("app")
    ///     .level(LogLevel::Debug)
    ///     .pattern("[{level}] {message}")
    ///     .sink(memory)
    ///     .build()
    ///     .unwrap();
    /// assert!(logger.enabled(LogLevel::Debug));
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }
}

impl Logger<SingleThreaded> {
    /// A root logger of a new hierarchy that never leaves its thread.
    #[must_use]
    pub fn single_threaded(name: impl Into<String>) -> Self {
        Self::with_policy(name)
    }
}

impl<P: SyncPolicy> Logger<P> {
    /// A root logger of a new hierarchy using policy `P`.
    #[must_use]
    pub fn with_policy(name: impl Into<String>) -> Self {
        let tree = SinkTree::<P>::new();
        let driver = tree.attach(None, LevelFilter::default());
        Self::from_parts(name, driver, Style::new(default_pattern(), LevelNames::new()))
    }

    fn from_parts(name: impl Into<String>, driver: SinkDriver<P>, style: Style) -> Self {
        Self {
            name: CachedString::new(name),
            driver,
            style: P::cell(style),
            metrics: LoggerMetrics::new(),
        }
    }

    /// A new logger under this one.
    ///
    /// The child starts with this logger's level, pattern and level names,
    /// and inherits its destinations through the hierarchy.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Logger<P> {
        let driver = self
            .driver
            .tree()
            .attach(Some(self.id()), LevelFilter::new(self.level()));
        Self::from_parts(name, driver, self.style())
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.driver.id()
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.driver.parent()
    }

    /// Move this logger under `parent`, or make it a root with `None`.
    ///
    /// Returns `false` if `parent` belongs to another hierarchy or is this
    /// logger or one of its descendants.
    pub fn reparent(&self, parent: Option<&Logger<P>>) -> bool {
        self.driver.set_parent(parent.map(|parent| &parent.driver))
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.driver.level().get()
    }

    /// Change the level. Destinations this logger owns follow it for every
    /// descendant that inherits them.
    pub fn set_level(&self, level: LogLevel) {
        self.driver.level().set(level);
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.driver.level().enabled(level)
    }

    /// Compile `template` and use it from now on.
    ///
    /// On error the current pattern stays in effect.
    pub fn set_pattern(&self, template: &str) -> Result<()> {
        let pattern = Arc::new(CompiledPattern::compile(template)?);
        self.style.write().pattern = pattern;
        Ok(())
    }

    /// The template of the pattern currently in effect.
    pub fn pattern(&self) -> String {
        self.style.read().pattern.template().to_string()
    }

    /// Text `{level}` renders for `level`.
    pub fn set_level_name(&self, level: LogLevel, name: impl Into<String>) {
        let mut style = self.style.write();
        Arc::make_mut(&mut style.level_names).set(level, name);
    }

    pub fn level_name(&self, level: LogLevel) -> String {
        self.style.read().level_names.get(level).as_str().to_string()
    }

    /// Apply `config` as a unit: if its pattern does not compile, nothing
    /// changes.
    pub fn apply_config(&self, config: &LoggerConfig) -> Result<()> {
        let pattern = config.compile_pattern()?;
        let level_names = Arc::new(config.level_names());

        self.set_level(config.level);
        let mut style = self.style.write();
        if let Some(pattern) = pattern {
            style.pattern = Arc::new(pattern);
        }
        style.level_names = level_names;
        Ok(())
    }

    /// Add a destination owned by this logger. `false` if already present.
    pub fn add_sink(&self, sink: &SinkHandle) -> bool {
        self.driver.add_sink(sink)
    }

    /// Remove a destination this logger owns. `false` if it had none such.
    pub fn remove_sink(&self, sink: &SinkHandle) -> bool {
        self.driver.remove_sink(sink)
    }

    /// Enable or disable a destination this logger has an entry for.
    ///
    /// To silence an inherited destination, add it locally first and then
    /// disable it.
    pub fn set_sink_enabled(&self, sink: &SinkHandle, enabled: bool) -> bool {
        self.driver.set_sink_enabled(sink, enabled)
    }

    /// Destinations a call on this logger reaches, with the logger owning each.
    pub fn effective_sinks(&self) -> Vec<(SinkId, NodeId)> {
        self.driver.effective_sinks()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Log a message that is already text.
    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.check(level) {
            return;
        }
        let style = self.style();
        self.dispatch(&style, SourceLocation::default(), Record::new(level, message));
    }

    /// Log preformatted arguments; they are rendered only if a destination
    /// reads the message, and then only once.
    pub fn log_fmt(&self, level: LogLevel, location: SourceLocation, args: fmt::Arguments<'_>) {
        if !self.check(level) {
            return;
        }
        let style = self.style();
        self.dispatch(&style, location, Record::from_args(level, args));
    }

    /// Log a message written by `producer`.
    ///
    /// `producer` is not called when `level` is filtered out, and is called
    /// at most once however many destinations receive the record.
    pub fn log_with<F>(&self, level: LogLevel, producer: F)
    where
        F: Fn(&mut dyn fmt::Write) -> fmt::Result,
    {
        if !self.check(level) {
            return;
        }
        let style = self.style();
        self.dispatch(
            &style,
            SourceLocation::default(),
            Record::from_producer(level, &producer),
        );
    }

    #[inline]
    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }

    /// Flush every destination this logger reaches.
    pub fn flush(&self) {
        self.driver.flush();
    }

    #[inline]
    fn check(&self, level: LogLevel) -> bool {
        if self.enabled(level) {
            true
        } else {
            self.metrics.record_filtered();
            false
        }
    }

    /// Snapshot of the current style; the lock is not held while sinks run.
    fn style(&self) -> Style {
        self.style.read().clone()
    }

    fn dispatch<'a>(&'a self, style: &'a Style, location: SourceLocation, record: Record<'a>) {
        let level = record.level();
        let record = record
            .with_category(self.name.view())
            .with_level_name(style.level_names.get(level).view())
            .with_location(location)
            .with_pattern(&style.pattern);

        let delivered = self.driver.dispatch(&record);
        self.metrics.record_dispatched(delivered);
    }
}

impl<P: SyncPolicy> fmt::Debug for Logger<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name.as_str())
            .field("id", &self.id())
            .field("level", &self.level())
            .finish()
    }
}

fn default_pattern() -> CompiledPattern {
    CompiledPattern::compile(DEFAULT_PATTERN).unwrap_or_else(|_| CompiledPattern::message_only())
}

/// Builder for constructing a root Logger with a fluent API
///
/// # Example
/// ```
/// use pattern_sink_logger::prelude::*;
///
/// let logger = Logger::builder("server")
///     .level(LogLevel::Warning)
///     .level_name(LogLevel::Warning, "WRN")
///     .build()
///     .unwrap();
/// assert_eq!(logger.level_name(LogLevel::Warning), "WRN");
/// ```
pub struct LoggerBuilder {
    name: String,
    config: LoggerConfig,
    sinks: Vec<SinkHandle>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: LoggerConfig::default(),
            sinks: Vec::new(),
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Set the pattern template; compiled by [`LoggerBuilder::build`]
    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, template: impl Into<String>) -> Self {
        self.config.pattern = Some(template.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level_name(mut self, level: LogLevel, name: impl Into<String>) -> Self {
        self.config.level_names.insert(level, name.into());
        self
    }

    /// Start from a deserialized configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a destination owned by the root logger
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: SinkHandle) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build a thread-safe Logger
    pub fn build(self) -> Result<Logger> {
        self.build_with_policy()
    }

    /// Build a Logger using policy `P`
    pub fn build_with_policy<P: SyncPolicy>(self) -> Result<Logger<P>> {
        let logger = Logger::<P>::with_policy(self.name);
        logger.apply_config(&self.config)?;
        for sink in &self.sinks {
            if !logger.add_sink(sink) {
                return Err(LoggerError::config(
                    "LoggerBuilder",
                    format!("{} was added more than once", sink.id()),
                ));
            }
        }
        Ok(logger)
    }
}
