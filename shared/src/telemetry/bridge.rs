//! The telemetry bridge.
//!
//! A [`TelemetryBridge`] is built once at startup and then only read. It
//! offers the three capabilities handlers need: leveled logs, metric samples
//! and scoped spans. A bridge without a sink still does all of the local
//! work (console logging, span bookkeeping) and simply exports nothing.

use super::connection::ConnectionString;
use super::otlp::{OtlpSink, TelemetryInitError};
use super::sink::TelemetrySink;
use super::span::{ActiveSpan, SpanContext};
use crate::models::{Attributes, LogLevel, LogRecord, MetricKind, MetricSample, SpanKind, SpanRecord};
use std::sync::{Arc, OnceLock};
use validator::Validate;

static GLOBAL: OnceLock<TelemetryBridge> = OnceLock::new();

/// Settings describing this service to the telemetry backend.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute.
    pub service_name: String,
    /// `service.version` resource attribute.
    pub service_version: String,
    /// `deployment.environment` resource attribute.
    pub environment: String,
    /// Backend credential; `None` disables export.
    pub connection_string: Option<String>,
}

impl TelemetryConfig {
    /// Creates a config with no backend credential.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            connection_string: None,
        }
    }

    /// Sets the backend credential.
    #[must_use]
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }
}

struct Inner {
    service: String,
    sink: Option<Arc<dyn TelemetrySink>>,
}

/// Process-wide handle to the telemetry pipeline.
///
/// Cloning is cheap; all clones share the same sink.
///
/// # Example
///
/// ```
/// use shared::models::{Attributes, LogLevel, MetricKind};
/// use shared::telemetry::{InMemorySink, TelemetryBridge};
/// use std::sync::Arc;
///
/// let sink = Arc::new(InMemorySink::new());
/// let bridge = TelemetryBridge::with_sink("doc-service", sink.clone());
///
/// bridge.emit_log(LogLevel::Info, "hello", Attributes::new().with("user_id", "u1"));
/// bridge.record_metric("demo.requests.total", 1.0, MetricKind::Counter, Attributes::new());
///
/// assert_eq!(sink.logs().len(), 1);
/// assert_eq!(sink.metrics().len(), 1);
/// ```
#[derive(Clone)]
pub struct TelemetryBridge {
    inner: Arc<Inner>,
}

impl TelemetryBridge {
    /// Builds the bridge from configuration. Never fails.
    ///
    /// A missing credential, an unparsable credential, or an exporter that
    /// cannot be built all produce a disabled bridge and a warning: the
    /// service must keep serving without its observability backend.
    #[must_use]
    pub fn initialize(config: TelemetryConfig) -> Self {
        let Some(raw) = config
            .connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        else {
            tracing::warn!(
                service = %config.service_name,
                "No telemetry connection string set; telemetry will not be exported"
            );
            return Self::disabled(config.service_name);
        };

        match Self::build_sink(raw, &config) {
            Ok(sink) => {
                tracing::info!(
                    service = %config.service_name,
                    "Telemetry export configured"
                );
                Self::with_sink(config.service_name, Arc::new(sink))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    service = %config.service_name,
                    "Telemetry backend unavailable; continuing without export"
                );
                Self::disabled(config.service_name)
            }
        }
    }

    fn build_sink(raw: &str, config: &TelemetryConfig) -> Result<OtlpSink, TelemetryInitError> {
        let connection = ConnectionString::parse(raw)?;
        tracing::debug!(endpoint = %connection.ingestion_endpoint, "Connecting telemetry exporters");
        OtlpSink::new(&connection, config)
    }

    /// Initializes the process-wide bridge once and returns it.
    ///
    /// Later calls return the first bridge and ignore their argument.
    pub fn init_global(config: TelemetryConfig) -> &'static TelemetryBridge {
        GLOBAL.get_or_init(|| Self::initialize(config))
    }

    /// Creates a bridge that forwards to the given sink.
    #[must_use]
    pub fn with_sink(service: impl Into<String>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                service: service.into(),
                sink: Some(sink),
            }),
        }
    }

    /// Creates a bridge that exports nothing.
    #[must_use]
    pub fn disabled(service: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                service: service.into(),
                sink: None,
            }),
        }
    }

    /// Returns true if records are forwarded to a sink.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.sink.is_some()
    }

    /// Service name stamped on every record.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.inner.service
    }

    /// Emits a log record at the given level.
    pub fn emit_log(&self, level: LogLevel, message: impl Into<String>, attributes: Attributes) {
        self.emit(LogRecord::new(level, message, self.service()).with_attributes(attributes));
    }

    /// Emits a log record correlated with an open span.
    pub fn emit_log_in(
        &self,
        span: &SpanContext,
        level: LogLevel,
        message: impl Into<String>,
        attributes: Attributes,
    ) {
        self.emit(
            LogRecord::new(level, message, self.service())
                .with_attributes(attributes)
                .with_span(&span.trace_id, &span.span_id),
        );
    }

    /// Emits a fully built log record.
    ///
    /// The record is mirrored to the local `tracing` subscriber first.
    pub fn emit(&self, record: LogRecord) {
        if let Err(e) = record.validate() {
            tracing::warn!(error = %e, "Dropping invalid log record");
            return;
        }

        let message = record.message.as_str();
        let attributes = &record.attributes;
        match record.level {
            LogLevel::Debug => tracing::debug!(%attributes, "{message}"),
            LogLevel::Info => tracing::info!(%attributes, "{message}"),
            LogLevel::Warning => tracing::warn!(%attributes, "{message}"),
            LogLevel::Error | LogLevel::Critical => tracing::error!(%attributes, "{message}"),
        }

        if let Some(sink) = &self.inner.sink {
            sink.emit_log(record);
        }
    }

    /// Records one metric sample. Invalid samples are dropped with a warning.
    pub fn record_metric(
        &self,
        name: impl Into<String>,
        value: f64,
        kind: MetricKind,
        attributes: Attributes,
    ) {
        let sample = MetricSample::new(name, value, kind).with_attributes(attributes);
        if let Err(e) = sample.validate_sample() {
            tracing::warn!(error = %e, metric = %sample.name, "Dropping invalid metric sample");
            return;
        }
        if let Some(sink) = &self.inner.sink {
            sink.record_metric(sample);
        }
    }

    /// Opens a new root span.
    #[must_use]
    pub fn start_span(&self, name: impl Into<String>) -> ActiveSpan {
        self.start_span_with_kind(name, SpanKind::Internal, None)
    }

    /// Opens an internal span under `parent`.
    #[must_use]
    pub fn start_span_in(&self, name: impl Into<String>, parent: &SpanContext) -> ActiveSpan {
        self.start_span_with_kind(name, SpanKind::Internal, Some(parent))
    }

    /// Opens a span of any kind, optionally under `parent`.
    #[must_use]
    pub fn start_span_with_kind(
        &self,
        name: impl Into<String>,
        kind: SpanKind,
        parent: Option<&SpanContext>,
    ) -> ActiveSpan {
        ActiveSpan::start(self.clone(), name, kind, parent)
    }

    pub(crate) fn export_span(&self, span: SpanRecord) {
        if let Some(sink) = &self.inner.sink {
            sink.export_span(span);
        }
    }

    /// Flushes and shuts down the sink.
    pub fn shutdown(&self) {
        if let Some(sink) = &self.inner.sink {
            sink.shutdown();
        }
    }
}

impl std::fmt::Debug for TelemetryBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryBridge")
            .field("service", &self.inner.service)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
