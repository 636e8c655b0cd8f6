//! Span data model.
//!
//! Defines the finished-span record produced when a scoped span closes.

use super::attributes::{AttributeValue, Attributes};
use super::TelemetryKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Status code for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    /// No status was set.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error,
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Kind of span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// An operation inside the service.
    #[default]
    Internal,
    /// An inbound request handled by the service.
    Server,
    /// An outbound call to a dependency.
    Client,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// An event within a span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    /// The name of the event.
    pub name: String,
    /// Timestamp when the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Additional attributes for the event.
    #[serde(default)]
    pub attributes: Attributes,
}

impl SpanEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            attributes,
        }
    }
}

/// A finished span.
///
/// # Example
///
/// ```
/// use shared::models::{SpanKind, SpanRecord, TelemetryKind};
///
/// let span = SpanRecord::new(
///     "0af7651916cd43dd8448eb211c80319c",
///     "b7ad6b7169203331",
///     "GET /health",
///     "otel-demo",
/// )
/// .with_kind(SpanKind::Server)
/// .with_attribute("http.response.status_code", 200);
///
/// assert!(span.is_root());
/// assert_eq!(span.telemetry_kind(), TelemetryKind::Request);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanRecord {
    /// Identifier of the trace this span belongs to (32 hex chars).
    pub trace_id: String,

    /// Identifier of this span (16 hex chars).
    pub span_id: String,

    /// The parent span ID (None for root spans).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// The operation name.
    pub name: String,

    /// The service that produced this span.
    pub service: String,

    /// The kind of span.
    #[serde(default)]
    pub kind: SpanKind,

    /// The status of the span.
    #[serde(default)]
    pub status: SpanStatus,

    /// Description attached to an error status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    /// Timestamp when the span started.
    pub start_time: DateTime<Utc>,

    /// Timestamp when the span ended.
    pub end_time: DateTime<Utc>,

    /// Additional attributes for the span.
    #[serde(default)]
    pub attributes: Attributes,

    /// Events that occurred during the span.
    #[serde(default)]
    pub events: Vec<SpanEvent>,
}

impl SpanRecord {
    /// Creates a new span with the current time as both start and end.
    #[must_use]
    pub fn new(
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
        name: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            name: name.into(),
            service: service.into(),
            kind: SpanKind::default(),
            status: SpanStatus::default(),
            status_message: None,
            start_time: now,
            end_time: now,
            attributes: Attributes::new(),
            events: Vec::new(),
        }
    }

    /// Sets the parent span ID.
    #[must_use]
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    /// Sets the span kind.
    #[must_use]
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Returns the duration of the span.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Returns true if this span has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }

    /// Returns true if an event with the given name was recorded.
    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name == name)
    }

    /// Classifies the span for the backend: requests, dependencies or plain spans.
    #[must_use]
    pub fn telemetry_kind(&self) -> TelemetryKind {
        match self.kind {
            SpanKind::Server => TelemetryKind::Request,
            SpanKind::Client => TelemetryKind::Dependency,
            SpanKind::Internal => TelemetryKind::Span,
        }
    }
}
