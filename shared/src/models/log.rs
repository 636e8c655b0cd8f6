//! Log data model.
//!
//! Defines the `LogRecord` structure handed to telemetry sinks.

use super::attributes::{AttributeValue, Attributes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attribute key marking a log record as an exception report.
pub const EXCEPTION_TYPE_KEY: &str = "exception.type";

/// Attribute key carrying the exception message.
pub const EXCEPTION_MESSAGE_KEY: &str = "exception.message";

/// Log severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostic output.
    Debug,
    /// Informational messages.
    #[default]
    Info,
    /// Something unusual happened.
    Warning,
    /// An operation failed.
    Error,
    /// The service cannot continue some function.
    Critical,
}

impl LogLevel {
    /// Backend severity number.
    ///
    /// `Debug` is 0, `Info` 1, `Warning` 2, `Error` 3 and `Critical` 4.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Critical => 4,
        }
    }

    /// Lowercase name of the level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log record representing a single log event.
///
/// # Example
///
/// ```
/// use shared::models::{LogLevel, LogRecord};
///
/// let log = LogRecord::new(LogLevel::Info, "User logged in", "auth-service")
///     .with_attribute("user_id", "12345");
///
/// assert_eq!(log.level.severity(), 1);
/// assert_eq!(log.attributes.get_str("user_id"), Some("12345"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogRecord {
    /// Timestamp when the log event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the log.
    #[serde(default)]
    pub level: LogLevel,

    /// The log message content.
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,

    /// Name of the service that generated the log.
    pub service: String,

    /// Additional key-value attributes.
    #[serde(default)]
    pub attributes: Attributes,

    /// Trace ID for correlation with the surrounding span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Span ID for correlation with the surrounding span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl LogRecord {
    /// Creates a new log record with the current timestamp.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            service: service.into(),
            attributes: Attributes::new(),
            trace_id: None,
            span_id: None,
        }
    }

    /// Adds an attribute to the log record.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Merges a set of attributes into the record.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Correlates the record with a span.
    #[must_use]
    pub fn with_span(mut self, trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = Some(span_id.into());
        self
    }

    /// Returns true if this record reports a caught exception.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.attributes.contains_key(EXCEPTION_TYPE_KEY)
    }
}
