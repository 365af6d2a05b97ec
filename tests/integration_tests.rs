//! Integration tests for pattern rendering and logger hierarchies
//!
//! These tests verify:
//! - Literal, padded and Unicode-aware rendering
//! - Destination inheritance and transitive disabling
//! - Re-parenting when a logger in the middle of a chain is dropped
//! - Lazy, at-most-once message production
//! - Pattern recompilation failures leaving the old pattern in place
//! - File output and declarative configuration

use pattern_sink_logger::core::sink_tree::NodeId;
use pattern_sink_logger::prelude::*;
#[cfg(feature = "file")]
use pattern_sink_logger::sinks::FileSink;
use pattern_sink_logger::text::GrowableBuffer;
use pattern_sink_logger::{info, SinkId, Timestamp};
use std::cell::Cell;
use std::sync::Arc;

fn render(template: &str, record: &Record<'_>) -> String {
    let pattern = CompiledPattern::compile(template).expect("pattern should compile");
    let mut buf: GrowableBuffer<u8, 128> = GrowableBuffer::new();
    pattern.format(&mut buf, record);
    String::from_utf8(buf.as_slice().to_vec()).expect("rendered text is UTF-8")
}

fn memory() -> (Arc<MemorySink>, SinkHandle) {
    let sink = Arc::new(MemorySink::new());
    let handle = SinkHandle::shared(Arc::clone(&sink));
    (sink, handle)
}

fn sink_ids(logger: &Logger) -> Vec<SinkId> {
    logger.effective_sinks().into_iter().map(|(id, _)| id).collect()
}

#[test]
fn test_literal_template_round_trips() {
    let record = Record::new(LogLevel::Info, "hi").with_category("any");
    assert_eq!(render("literal text", &record), "literal text");
    assert_eq!(render("{message}", &record), "hi");
    assert_eq!(render("{{literal}} {message}", &record), "{literal} hi");
}

#[test]
fn test_center_padding() {
    let record = Record::new(LogLevel::Info, "m").with_category("ab");
    assert_eq!(render("{category:*^10}", &record), "****ab****");
}

#[test]
fn test_width_counts_codepoints_not_bytes() {
    let record = Record::new(LogLevel::Info, "m").with_category("héllo");
    let out = render("{category:>10}", &record);
    assert_eq!(out, "     héllo");
    assert_eq!(out.chars().count(), 10);
    assert_eq!(out.len(), 11);
}

#[test]
fn test_inheritance_and_transitive_disable() {
    let (_, a) = memory();
    let (_, b) = memory();

    let root = Logger::new("root");
    root.add_sink(&a);
    let child = root.child("child");
    assert_eq!(child.effective_sinks(), vec![(a.id(), root.id())]);

    child.add_sink(&b);
    assert_eq!(
        child.effective_sinks(),
        vec![(a.id(), root.id()), (b.id(), child.id())]
    );

    root.set_sink_enabled(&a, false);
    assert!(root.effective_sinks().is_empty());
    assert_eq!(child.effective_sinks(), vec![(b.id(), child.id())]);

    root.set_sink_enabled(&a, true);
    assert_eq!(sink_ids(&child), vec![a.id(), b.id()]);
}

#[test]
fn test_handles_over_one_sink_are_one_destination() {
    let sink = Arc::new(MemorySink::new());
    let first = SinkHandle::shared(Arc::clone(&sink));
    let second = SinkHandle::shared(Arc::clone(&sink));
    assert_eq!(first.id(), second.id());

    let root = Logger::new("app");
    root.set_pattern("{message}").unwrap();
    assert!(root.add_sink(&first));
    assert!(!root.add_sink(&second));

    root.info("x");
    assert_eq!(sink.lines(), vec!["x"]);
    assert_eq!(root.effective_sinks().len(), 1);

    let child = root.child("db");
    assert!(child.add_sink(&second));
    assert!(child.set_sink_enabled(&first, false));
    assert!(child.effective_sinks().is_empty());

    assert!(root.remove_sink(&second));
    assert!(root.effective_sinks().is_empty());
}

#[test]
fn test_dropping_middle_logger_reparents_grandchild() {
    let (_, a) = memory();
    let (_, b) = memory();
    let (_, c_only) = memory();
    let (_, g_only) = memory();

    let root = Logger::new("root");
    root.add_sink(&a);
    root.add_sink(&b);

    let middle = root.child("middle");
    middle.add_sink(&c_only);

    let grandchild = middle.child("grandchild");
    grandchild.add_sink(&g_only);
    grandchild.add_sink(&b);
    grandchild.set_sink_enabled(&b, false);

    assert_eq!(sink_ids(&grandchild), vec![a.id(), c_only.id(), g_only.id()]);

    drop(middle);
    assert_eq!(grandchild.parent_id(), Some(root.id()));

    let direct = root.child("direct");
    direct.add_sink(&g_only);
    direct.add_sink(&b);
    direct.set_sink_enabled(&b, false);

    assert_eq!(sink_ids(&grandchild), sink_ids(&direct));
    let owners: Vec<NodeId> = grandchild
        .effective_sinks()
        .into_iter()
        .map(|(_, owner)| owner)
        .collect();
    assert_eq!(owners, vec![root.id(), grandchild.id()]);
}

#[test]
fn test_producer_runs_once_for_many_sinks() {
    let (first, a) = memory();
    let (second, b) = memory();
    let logger = Logger::new("app");
    logger.set_pattern("{message}").unwrap();
    logger.add_sink(&a);
    logger.add_sink(&b);

    let calls = Cell::new(0);
    logger.log_with(LogLevel::Warning, |out| {
        calls.set(calls.get() + 1);
        write!(out, "side effect #{}", calls.get())
    });

    assert_eq!(calls.get(), 1);
    assert_eq!(first.lines(), vec!["side effect #1"]);
    assert_eq!(second.lines(), vec!["side effect #1"]);
}

#[test]
fn test_panicking_producer_runs_once_for_many_sinks() {
    let (first, a) = memory();
    let (second, b) = memory();
    let logger = Logger::new("app");
    logger.set_pattern("{message}").unwrap();
    logger.add_sink(&a);
    logger.add_sink(&b);

    let calls = Cell::new(0);
    logger.log_with(LogLevel::Error, |out| {
        calls.set(calls.get() + 1);
        out.write_str("partial")?;
        panic!("producer failed after writing");
    });

    assert_eq!(calls.get(), 1);
    assert_eq!(first.lines(), vec!["partial"]);
    assert_eq!(second.lines(), vec!["partial"]);
}

#[test]
fn test_filtered_call_never_runs_producer() {
    let (sink, handle) = memory();
    let logger = Logger::new("app");
    logger.add_sink(&handle);

    let calls = Cell::new(0);
    logger.log_with(LogLevel::Trace, |out| {
        calls.set(calls.get() + 1);
        out.write_str("never")
    });

    assert_eq!(calls.get(), 0);
    assert!(sink.is_empty());
    assert_eq!(logger.metrics().records_filtered(), 1);
}

#[test]
fn test_failed_recompile_keeps_previous_pattern() {
    let (sink, handle) = memory();
    let logger = Logger::new("app");
    logger.add_sink(&handle);

    logger.set_pattern("{message}").unwrap();
    logger.info("before");
    let err = logger.set_pattern("{unknown}").unwrap_err();
    assert!(matches!(err, LoggerError::Pattern(_)));
    logger.info("after");

    assert_eq!(sink.lines(), vec!["before", "after"]);
}

#[test]
fn test_shared_sink_respects_each_owner_level() {
    let (sink, shared) = memory();
    let root = Logger::new("root");
    root.set_pattern("{category}:{message}").unwrap();
    root.set_level(LogLevel::Error);
    root.add_sink(&shared);

    let verbose = root.child("verbose");
    verbose.set_level(LogLevel::Debug);

    // Inherited from root: only root's level decides.
    verbose.info("dropped");
    assert!(sink.is_empty());

    // Owned locally: the child's own level decides.
    verbose.add_sink(&shared);
    verbose.info("kept");
    assert_eq!(sink.lines(), vec!["verbose:kept"]);
}

#[test]
fn test_sink_pattern_override() {
    let plain = Arc::new(MemorySink::with_pattern("{level:>7}|{message}").unwrap());
    let (logged, handle) = memory();

    let logger = Logger::new("app");
    logger.set_pattern("{category} {message}").unwrap();
    logger.add_sink(&SinkHandle::shared(Arc::clone(&plain)));
    logger.add_sink(&handle);

    logger.warn("careful");
    assert_eq!(plain.lines(), vec!["WARNING|careful"]);
    assert_eq!(logged.lines(), vec!["app careful"]);
}

#[test]
fn test_single_threaded_hierarchy() {
    let (sink, handle) = memory();
    let root = Logger::single_threaded("st");
    root.set_pattern("{category}/{message}").unwrap();
    root.add_sink(&handle);

    let child = root.child("leaf");
    info!(child, "n={}", 3);
    assert_eq!(sink.lines(), vec!["leaf/n=3"]);
}

#[cfg(feature = "file")]
#[test]
fn test_file_sink_receives_formatted_lines() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.log");

    let logger = Logger::builder("file")
        .pattern("[{level}] {category}: {message}")
        .sink(SinkHandle::new(FileSink::new(&log_file).expect("Failed to create sink")))
        .build()
        .unwrap();

    logger.info("one");
    logger.child("sub").error("two");
    logger.flush();

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content, "[INFO] file: one\n[ERROR] sub: two\n");
}

#[test]
fn test_json_config_drives_builder() {
    let (sink, handle) = memory();
    let config = LoggerConfig::from_json(
        r#"{
            "level": "warning",
            "pattern": "{level:-<5}{message}",
            "level_names": { "warning": "W", "error": "E" }
        }"#,
    )
    .unwrap();

    let logger = Logger::builder("cfg").config(config).sink(handle).build().unwrap();
    logger.info("hidden");
    logger.warn("w");
    logger.error("e");
    assert_eq!(sink.lines(), vec!["W----w", "E----e"]);
}

#[test]
fn test_timestamp_fields() {
    let record = Record::new(LogLevel::Info, "m")
        .with_timestamp(Timestamp::new(1_700_000_000, 123_456_789));
    assert_eq!(
        render("{time:iso8601}|{time:unix_ms}|{msec}", &record),
        "2023-11-14T22:13:20.123Z|1700000000123|123"
    );
    assert_eq!(render("{time:%H.%M}", &record), "22.13");
}
