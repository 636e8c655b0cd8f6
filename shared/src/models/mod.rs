//! Telemetry record models.
//!
//! Every record is ephemeral: it is built by a handler, handed to a sink and
//! never retained by the service itself.

pub mod attributes;
pub mod log;
pub mod metric;
pub mod trace;

pub use attributes::{AttributeValue, Attributes};
pub use log::{LogLevel, LogRecord, EXCEPTION_MESSAGE_KEY, EXCEPTION_TYPE_KEY};
pub use metric::{MetricKind, MetricSample, MetricValidationError};
pub use trace::{SpanEvent, SpanKind, SpanRecord, SpanStatus};

use serde::Serialize;

/// The categories of telemetry a backend distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryKind {
    /// An inbound request (server span).
    Request,
    /// An outbound call (client span).
    Dependency,
    /// An internal span.
    Span,
    /// A plain log record.
    Log,
    /// A log record reporting a caught exception.
    Exception,
    /// A metric sample.
    Metric,
}

impl LogRecord {
    /// Classifies the record as a plain log or an exception report.
    #[must_use]
    pub fn telemetry_kind(&self) -> TelemetryKind {
        if self.is_exception() {
            TelemetryKind::Exception
        } else {
            TelemetryKind::Log
        }
    }
}
