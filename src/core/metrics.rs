//! Logger metrics for observability
//!
//! Counters for how many calls a logger let through, how many its level
//! filtered out, and how many times a destination actually received a record.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use pattern_sink_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dispatched(2);
/// metrics.record_filtered();
///
/// assert_eq!(metrics.records_dispatched(), 1);
/// assert_eq!(metrics.deliveries(), 2);
/// assert_eq!(metrics.records_filtered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Calls that passed the level check and were dispatched
    records_dispatched: AtomicU64,

    /// Calls dropped by the logger's own level
    records_filtered: AtomicU64,

    /// Individual record deliveries to destinations
    deliveries: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_dispatched: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_dispatched(&self) -> u64 {
        self.records_dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_filtered(&self) -> u64 {
        self.records_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    /// Record one dispatched call that reached `delivered` destinations
    #[inline]
    pub fn record_dispatched(&self, delivered: usize) -> u64 {
        self.deliveries
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.records_dispatched.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a call rejected by the level check
    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.records_filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of calls that were filtered, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no calls have been made.
    pub fn filter_rate(&self) -> f64 {
        let filtered = self.records_filtered() as f64;
        let total = self.records_dispatched() as f64 + filtered;
        if total == 0.0 {
            0.0
        } else {
            (filtered / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_dispatched.store(0, Ordering::Relaxed);
        self.records_filtered.store(0, Ordering::Relaxed);
        self.deliveries.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_dispatched: AtomicU64::new(self.records_dispatched()),
            records_filtered: AtomicU64::new(self.records_filtered()),
            deliveries: AtomicU64::new(self.deliveries()),
        }
    }
}
