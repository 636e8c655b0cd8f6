//! The telemetry bridge.
//!
//! Connects handlers to a telemetry backend through three capabilities:
//! leveled logs, metric samples and scoped spans.
//!
//! - [`TelemetryBridge`] - the handle passed to every handler
//! - [`TelemetrySink`] - the exporter seam, with [`InMemorySink`] and [`OtlpSink`]
//! - [`ConnectionString`] - the backend credential

mod bridge;
mod connection;
mod otlp;
mod sink;
mod span;

pub use bridge::{TelemetryBridge, TelemetryConfig};
pub use connection::{ConnectionString, ConnectionStringError, DEFAULT_INGESTION_ENDPOINT};
pub use otlp::{OtlpSink, TelemetryInitError, INSTRUMENTATION_KEY_HEADER};
pub use sink::{InMemorySink, TelemetrySink};
pub use span::{ActiveSpan, SpanContext};
