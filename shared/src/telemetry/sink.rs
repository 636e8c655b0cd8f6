//! Telemetry sink trait and the in-memory implementation.
//!
//! A sink is the exporter side of the bridge. Every method is infallible
//! from the caller's view: a sink that cannot deliver a record drops it.

use crate::models::{LogRecord, MetricSample, SpanRecord};
use std::sync::{PoisonError, RwLock};

/// Destination for finished telemetry records.
pub trait TelemetrySink: Send + Sync {
    /// Accepts one log record.
    fn emit_log(&self, record: LogRecord);

    /// Accepts one metric sample.
    fn record_metric(&self, sample: MetricSample);

    /// Accepts one finished span.
    fn export_span(&self, span: SpanRecord);

    /// Flushes buffered records and releases exporter resources.
    fn shutdown(&self) {}
}

/// A sink that keeps every record in memory.
///
/// Useful for tests and local inspection; nothing is ever evicted.
///
/// # Example
///
/// ```
/// use shared::models::{LogLevel, LogRecord};
/// use shared::telemetry::{InMemorySink, TelemetrySink};
///
/// let sink = InMemorySink::new();
/// sink.emit_log(LogRecord::new(LogLevel::Info, "hello", "svc"));
///
/// assert_eq!(sink.logs().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySink {
    logs: RwLock<Vec<LogRecord>>,
    metrics: RwLock<Vec<MetricSample>>,
    spans: RwLock<Vec<SpanRecord>>,
}

impl InMemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all log records.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a snapshot of all metric samples.
    #[must_use]
    pub fn metrics(&self) -> Vec<MetricSample> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a snapshot of all finished spans, in completion order.
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the first finished span with the given name.
    #[must_use]
    pub fn span_named(&self, name: &str) -> Option<SpanRecord> {
        self.spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }
}

impl TelemetrySink for InMemorySink {
    fn emit_log(&self, record: LogRecord) {
        self.logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    fn record_metric(&self, sample: MetricSample) {
        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }

    fn export_span(&self, span: SpanRecord) {
        self.spans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }
}
