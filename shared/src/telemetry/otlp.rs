//! OTLP/HTTP exporting sink.
//!
//! Translates finished records into OpenTelemetry SDK calls. Logs and spans
//! go through batch processors and metrics through a periodic reader, so a
//! call into this sink only enqueues work; a full queue drops the record
//! instead of blocking the request path.

use super::bridge::TelemetryConfig;
use super::connection::{ConnectionString, ConnectionStringError};
use super::sink::TelemetrySink;
use crate::models::{
    AttributeValue, Attributes, LogLevel, LogRecord, MetricKind, MetricSample, SpanKind,
    SpanRecord, SpanStatus,
};
use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, LoggerProvider as _, Severity};
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, MeterProvider as _};
use opentelemetry::trace::{
    Event, Span as _, SpanContext, SpanId, Status, TraceContextExt as _, TraceFlags, TraceId,
    TraceState, Tracer as _, TracerProvider as _,
};
use opentelemetry::{Context, KeyValue, Value};
use opentelemetry_otlp::{WithExportConfig as _, WithHttpConfig as _};
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;
use thiserror::Error;

/// Header carrying the instrumentation key on every export request.
pub const INSTRUMENTATION_KEY_HEADER: &str = "x-instrumentation-key";

/// Instrumentation scope name for everything this service emits.
const SCOPE_NAME: &str = "otel-demo";

/// Errors that can occur while setting up the exporting sink.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    ConnectionString(#[from] ConnectionStringError),

    /// An OTLP exporter could not be built.
    #[error("Failed to build {signal} exporter: {message}")]
    Exporter {
        /// The signal whose exporter failed (logs, metrics or traces).
        signal: &'static str,
        /// The underlying error.
        message: String,
    },
}

/// A metric instrument, built once per name and kind.
#[derive(Clone)]
enum Instrument {
    Counter(Counter<f64>),
    Histogram(Histogram<f64>),
    Gauge(Gauge<f64>),
}

impl Instrument {
    fn build(meter: &Meter, name: String, kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => Self::Counter(meter.f64_counter(name).build()),
            MetricKind::Histogram => Self::Histogram(meter.f64_histogram(name).build()),
            MetricKind::Gauge => Self::Gauge(meter.f64_gauge(name).build()),
        }
    }

    fn observe(&self, value: f64, attributes: &[KeyValue]) {
        match self {
            Self::Counter(counter) => counter.add(value, attributes),
            Self::Histogram(histogram) => histogram.record(value, attributes),
            Self::Gauge(gauge) => gauge.record(value, attributes),
        }
    }
}

/// Sink exporting to an OTLP/HTTP ingestion endpoint.
pub struct OtlpSink {
    logger_provider: SdkLoggerProvider,
    logger: SdkLogger,
    meter_provider: SdkMeterProvider,
    meter: Meter,
    instruments: RwLock<HashMap<(MetricKind, String), Instrument>>,
    tracer_provider: SdkTracerProvider,
    tracer: SdkTracer,
}

impl OtlpSink {
    /// Builds the log, metric and trace pipelines for the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three OTLP exporters cannot be built.
    pub fn new(
        connection: &ConnectionString,
        config: &TelemetryConfig,
    ) -> Result<Self, TelemetryInitError> {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attributes([
                KeyValue::new("service.version", config.service_version.clone()),
                KeyValue::new("deployment.environment", config.environment.clone()),
            ])
            .build();

        let headers = HashMap::from([(
            INSTRUMENTATION_KEY_HEADER.to_string(),
            connection.instrumentation_key.clone(),
        )]);

        let span_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(connection.signal_url("traces"))
            .with_headers(headers.clone())
            .build()
            .map_err(|e| TelemetryInitError::Exporter {
                signal: "traces",
                message: e.to_string(),
            })?;

        let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_http()
            .with_endpoint(connection.signal_url("metrics"))
            .with_headers(headers.clone())
            .build()
            .map_err(|e| TelemetryInitError::Exporter {
                signal: "metrics",
                message: e.to_string(),
            })?;

        let log_exporter = opentelemetry_otlp::LogExporter::builder()
            .with_http()
            .with_endpoint(connection.signal_url("logs"))
            .with_headers(headers)
            .build()
            .map_err(|e| TelemetryInitError::Exporter {
                signal: "logs",
                message: e.to_string(),
            })?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_batch_exporter(span_exporter)
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_resource(resource.clone())
            .with_periodic_exporter(metric_exporter)
            .build();
        let logger_provider = SdkLoggerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(log_exporter)
            .build();

        Ok(Self::from_providers(
            logger_provider,
            meter_provider,
            tracer_provider,
        ))
    }

    fn from_providers(
        logger_provider: SdkLoggerProvider,
        meter_provider: SdkMeterProvider,
        tracer_provider: SdkTracerProvider,
    ) -> Self {
        Self {
            logger: logger_provider.logger(SCOPE_NAME),
            logger_provider,
            meter: meter_provider.meter(SCOPE_NAME),
            meter_provider,
            instruments: RwLock::new(HashMap::new()),
            tracer: tracer_provider.tracer(SCOPE_NAME),
            tracer_provider,
        }
    }

    /// Returns the cached instrument for a metric, building it on first use.
    fn instrument(&self, name: &str, kind: MetricKind) -> Instrument {
        let key = (kind, name.to_string());
        if let Some(instrument) = self
            .instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return instrument.clone();
        }

        let mut instruments = self
            .instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        instruments
            .entry(key)
            .or_insert_with(|| Instrument::build(&self.meter, name.to_string(), kind))
            .clone()
    }
}

impl TelemetrySink for OtlpSink {
    fn emit_log(&self, record: LogRecord) {
        let mut log = self.logger.create_log_record();
        log.set_timestamp(record.timestamp.into());
        log.set_observed_timestamp(SystemTime::now());
        log.set_severity_number(severity(record.level));
        log.set_severity_text(record.level.as_str());
        for (key, value) in record.attributes.iter() {
            log.add_attribute(key.clone(), any_value(value));
        }
        if let (Some(trace_id), Some(span_id)) = (&record.trace_id, &record.span_id) {
            if let (Ok(trace_id), Ok(span_id)) =
                (TraceId::from_hex(trace_id), SpanId::from_hex(span_id))
            {
                log.set_trace_context(trace_id, span_id, Some(TraceFlags::SAMPLED));
            }
        }
        log.set_body(AnyValue::from(record.message));
        self.logger.emit(log);
    }

    fn record_metric(&self, sample: MetricSample) {
        let attributes = key_values(&sample.attributes);
        self.instrument(&sample.name, sample.kind)
            .observe(sample.value, &attributes);
    }

    fn export_span(&self, span: SpanRecord) {
        let (Ok(trace_id), Ok(span_id)) = (
            TraceId::from_hex(&span.trace_id),
            SpanId::from_hex(&span.span_id),
        ) else {
            tracing::warn!(
                trace_id = %span.trace_id,
                span_id = %span.span_id,
                "Dropping span with malformed identifiers"
            );
            return;
        };

        let parent_cx = match span.parent_span_id.as_deref().map(SpanId::from_hex) {
            Some(Ok(parent_id)) => Context::new().with_remote_span_context(SpanContext::new(
                trace_id,
                parent_id,
                TraceFlags::SAMPLED,
                true,
                TraceState::default(),
            )),
            _ => Context::new(),
        };

        let events = span
            .events
            .iter()
            .map(|e| {
                Event::new(
                    e.name.clone(),
                    e.timestamp.into(),
                    key_values(&e.attributes),
                    0,
                )
            })
            .collect();

        let status = match span.status {
            SpanStatus::Unset => Status::Unset,
            SpanStatus::Ok => Status::Ok,
            SpanStatus::Error => Status::error(span.status_message.clone().unwrap_or_default()),
        };

        let mut builder = self
            .tracer
            .span_builder(span.name)
            .with_kind(span_kind(span.kind))
            .with_start_time(SystemTime::from(span.start_time))
            .with_attributes(key_values(&span.attributes))
            .with_events(events)
            .with_status(status);
        builder.trace_id = Some(trace_id);
        builder.span_id = Some(span_id);

        let mut otel_span = builder.start_with_context(&self.tracer, &parent_cx);
        otel_span.end_with_timestamp(span.end_time.into());
    }

    fn shutdown(&self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
        if let Err(e) = self.meter_provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
        if let Err(e) = self.logger_provider.shutdown() {
            tracing::warn!(error = %e, "Logger provider shutdown failed");
        }
    }
}

fn severity(level: LogLevel) -> Severity {
    match level {
        LogLevel::Debug => Severity::Debug,
        LogLevel::Info => Severity::Info,
        LogLevel::Warning => Severity::Warn,
        LogLevel::Error => Severity::Error,
        LogLevel::Critical => Severity::Fatal,
    }
}

fn span_kind(kind: SpanKind) -> opentelemetry::trace::SpanKind {
    match kind {
        SpanKind::Internal => opentelemetry::trace::SpanKind::Internal,
        SpanKind::Server => opentelemetry::trace::SpanKind::Server,
        SpanKind::Client => opentelemetry::trace::SpanKind::Client,
    }
}

fn any_value(value: &AttributeValue) -> AnyValue {
    match value {
        AttributeValue::Bool(b) => AnyValue::from(*b),
        AttributeValue::Int(i) => AnyValue::from(*i),
        AttributeValue::Float(f) => AnyValue::from(*f),
        AttributeValue::String(s) => AnyValue::from(s.clone()),
    }
}

fn otel_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Bool(b) => Value::from(*b),
        AttributeValue::Int(i) => Value::from(*i),
        AttributeValue::Float(f) => Value::from(*f),
        AttributeValue::String(s) => Value::from(s.clone()),
    }
}

fn key_values(attributes: &Attributes) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), otel_value(v)))
        .collect()
}
