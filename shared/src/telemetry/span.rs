//! Scoped spans.
//!
//! An [`ActiveSpan`] is exported exactly once, when it is ended explicitly
//! or when it goes out of scope, whichever happens first.

use super::bridge::TelemetryBridge;
use crate::models::{
    AttributeValue, Attributes, LogLevel, SpanEvent, SpanKind, SpanRecord, SpanStatus,
    EXCEPTION_MESSAGE_KEY, EXCEPTION_TYPE_KEY,
};
use chrono::{Duration, Utc};
use opentelemetry_sdk::trace::{IdGenerator, RandomIdGenerator};
use serde::Serialize;

/// Identifies an open span so that children and logs can refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanContext {
    /// Trace identifier, 32 lowercase hex characters.
    pub trace_id: String,
    /// Span identifier, 16 lowercase hex characters.
    pub span_id: String,
}

/// A span that is currently open.
///
/// # Example
///
/// ```
/// use shared::telemetry::TelemetryBridge;
///
/// let bridge = TelemetryBridge::disabled("doc");
/// let mut parent = bridge.start_span("outer");
/// parent.set_attribute("operation.type", "demo");
/// {
///     let child = parent.child("inner");
///     assert_eq!(child.context().trace_id, parent.context().trace_id);
/// } // child ends here
/// parent.end();
/// ```
pub struct ActiveSpan {
    bridge: TelemetryBridge,
    context: SpanContext,
    record: Option<SpanRecord>,
}

impl ActiveSpan {
    pub(crate) fn start(
        bridge: TelemetryBridge,
        name: impl Into<String>,
        kind: SpanKind,
        parent: Option<&SpanContext>,
    ) -> Self {
        let ids = RandomIdGenerator::default();
        let trace_id = parent.map_or_else(
            || ids.new_trace_id().to_string(),
            |p| p.trace_id.clone(),
        );
        let span_id = ids.new_span_id().to_string();

        let mut record =
            SpanRecord::new(&trace_id, &span_id, name, bridge.service()).with_kind(kind);
        if let Some(parent) = parent {
            record = record.with_parent(&parent.span_id);
        }

        Self {
            bridge,
            context: SpanContext { trace_id, span_id },
            record: Some(record),
        }
    }

    /// Returns the identifiers of this span.
    #[must_use]
    pub fn context(&self) -> SpanContext {
        self.context.clone()
    }

    /// Time elapsed since the span started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.record
            .as_ref()
            .map_or_else(Duration::zero, |r| Utc::now() - r.start_time)
    }

    /// Sets or replaces an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        if let Some(record) = self.record.as_mut() {
            record.attributes.insert(key, value);
        }
    }

    /// Records a named event at the current time.
    pub fn add_event(&mut self, name: impl Into<String>, attributes: Attributes) {
        if let Some(record) = self.record.as_mut() {
            record.events.push(SpanEvent::new(name, attributes));
        }
    }

    /// Records a caught error as an `exception` event.
    ///
    /// The span status is left alone; call [`ActiveSpan::set_error`] when the
    /// error also fails the operation.
    pub fn record_exception(&mut self, exception_type: &str, error: &dyn std::error::Error) {
        self.add_event(
            "exception",
            Attributes::new()
                .with(EXCEPTION_TYPE_KEY, exception_type)
                .with(EXCEPTION_MESSAGE_KEY, error.to_string()),
        );
    }

    /// Marks the span as failed.
    pub fn set_error(&mut self, message: impl Into<String>) {
        if let Some(record) = self.record.as_mut() {
            record.status = SpanStatus::Error;
            record.status_message = Some(message.into());
        }
    }

    /// Marks the span as successful.
    pub fn set_ok(&mut self) {
        if let Some(record) = self.record.as_mut() {
            record.status = SpanStatus::Ok;
            record.status_message = None;
        }
    }

    /// Opens an internal child span.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> ActiveSpan {
        self.child_with_kind(name, SpanKind::Internal)
    }

    /// Opens a child span of the given kind.
    #[must_use]
    pub fn child_with_kind(&self, name: impl Into<String>, kind: SpanKind) -> ActiveSpan {
        self.bridge
            .start_span_with_kind(name, kind, Some(&self.context))
    }

    /// Emits a log record correlated with this span.
    pub fn emit_log(&self, level: LogLevel, message: impl Into<String>, attributes: Attributes) {
        self.bridge
            .emit_log_in(&self.context, level, message, attributes);
    }

    /// Ends the span now.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(mut record) = self.record.take() {
            record.end_time = Utc::now();
            self.bridge.export_span(record);
        }
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

impl std::fmt::Debug for ActiveSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSpan")
            .field("context", &self.context)
            .field("open", &self.record.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemorySink;
    use std::sync::Arc;

    fn bridge() -> (TelemetryBridge, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        (TelemetryBridge::with_sink("span-test", sink.clone()), sink)
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_ids_are_hex_of_expected_length() {
        let (bridge, _sink) = bridge();
        let span = bridge.start_span("op");
        let ctx = span.context();

        assert_eq!(ctx.trace_id.len(), 32);
        assert_eq!(ctx.span_id.len(), 16);
        assert!(ctx.trace_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(ctx.span_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_child_records_parent() {
        let (bridge, sink) = bridge();
        let parent = bridge.start_span("parent");
        let child = parent.child("child");
        let parent_ctx = parent.context();
        child.end();
        parent.end();

        let spans = sink.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "child");
        assert_eq!(spans[0].parent_span_id.as_deref(), Some(parent_ctx.span_id.as_str()));
        assert_eq!(spans[0].trace_id, parent_ctx.trace_id);
        assert!(spans[1].is_root());
    }

    #[test]
    fn test_drop_exports_once() {
        let (bridge, sink) = bridge();
        {
            let mut span = bridge.start_span("scoped");
            span.set_attribute("k", "v");
        }
        assert_eq!(sink.spans().len(), 1);
        assert_eq!(sink.spans()[0].attributes.get_str("k"), Some("v"));
    }

    #[test]
    fn test_early_return_still_closes_span() {
        fn work(bridge: &TelemetryBridge, fail: bool) -> Result<(), Boom> {
            let mut span = bridge.start_span("fallible");
            span.set_attribute("step", 1);
            if fail {
                return Err(Boom);
            }
            span.set_attribute("step", 2);
            Ok(())
        }

        let (bridge, sink) = bridge();
        assert!(work(&bridge, true).is_err());

        let span = sink.span_named("fallible").unwrap();
        assert_eq!(span.attributes.get("step"), Some(&AttributeValue::Int(1)));
    }

    #[test]
    fn test_record_exception_adds_event_only() {
        let (bridge, sink) = bridge();
        let mut span = bridge.start_span("caught");
        span.record_exception("Boom", &Boom);
        span.end();

        let span = sink.span_named("caught").unwrap();
        assert_eq!(span.status, SpanStatus::Unset);
        assert!(span.has_event("exception"));
        assert_eq!(
            span.events[0].attributes.get_str(EXCEPTION_TYPE_KEY),
            Some("Boom")
        );
    }

    #[test]
    fn test_set_error_and_ok() {
        let (bridge, sink) = bridge();
        let mut span = bridge.start_span("failing");
        span.set_error("boom");
        span.end();
        let failed = sink.span_named("failing").unwrap();
        assert_eq!(failed.status, SpanStatus::Error);
        assert_eq!(failed.status_message.as_deref(), Some("boom"));

        let mut span = bridge.start_span("recovered");
        span.set_error("transient");
        span.set_ok();
        span.end();
        let recovered = sink.span_named("recovered").unwrap();
        assert_eq!(recovered.status, SpanStatus::Ok);
        assert!(recovered.status_message.is_none());
    }

    #[test]
    fn test_emit_log_is_correlated() {
        let (bridge, sink) = bridge();
        let span = bridge.start_span("op");
        span.emit_log(LogLevel::Info, "inside", Attributes::new());
        let ctx = span.context();
        span.end();

        let logs = sink.logs();
        assert_eq!(logs[0].trace_id.as_deref(), Some(ctx.trace_id.as_str()));
        assert_eq!(logs[0].span_id.as_deref(), Some(ctx.span_id.as_str()));
    }

    #[test]
    fn test_end_time_not_before_start() {
        let (bridge, sink) = bridge();
        bridge.start_span("timed").end();
        let span = sink.span_named("timed").unwrap();
        assert!(span.duration() >= Duration::zero());
    }
}
