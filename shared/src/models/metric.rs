//! Metric data model.
//!
//! Defines the `MetricSample` structure for a single numeric measurement.

use super::attributes::{AttributeValue, Attributes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Instrument shape of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monotonic running total; each sample is an increment.
    Counter,
    /// Distribution; each sample is one observation.
    Histogram,
    /// Latest point-in-time value.
    Gauge,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Histogram => write!(f, "histogram"),
            Self::Gauge => write!(f, "gauge"),
        }
    }
}

/// A single measurement handed to the telemetry backend.
///
/// # Example
///
/// ```
/// use shared::models::{MetricKind, MetricSample};
///
/// let sample = MetricSample::new("demo.requests.total", 1.0, MetricKind::Counter)
///     .with_attribute("endpoint", "/demo/metrics");
///
/// assert!(sample.validate_sample().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MetricSample {
    /// The metric name (e.g. `demo.requests.total`).
    #[validate(length(min = 1, message = "Metric name cannot be empty"))]
    pub name: String,

    /// The measured value.
    pub value: f64,

    /// The instrument shape.
    pub kind: MetricKind,

    /// Additional key-value attributes.
    #[serde(default)]
    pub attributes: Attributes,

    /// Timestamp when the sample was taken.
    pub timestamp: DateTime<Utc>,
}

/// Errors that can occur during metric sample validation.
#[derive(Debug, Error)]
pub enum MetricValidationError {
    /// The metric name is empty.
    #[error("Metric name cannot be empty")]
    EmptyName,

    /// The value is NaN or infinite.
    #[error("Metric value must be finite, got {0}")]
    NonFiniteValue(f64),

    /// A counter was given a negative increment.
    #[error("Counter increment cannot be negative, got {0}")]
    NegativeCounterIncrement(f64),

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl MetricSample {
    /// Creates a new sample with the current timestamp.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            value,
            kind,
            attributes: Attributes::new(),
            timestamp: Utc::now(),
        }
    }

    /// Adds an attribute to the sample.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Merges a set of attributes into the sample.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Validates the sample.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty
    /// - The value is not finite
    /// - The sample is a counter with a negative increment
    pub fn validate_sample(&self) -> Result<(), MetricValidationError> {
        if self.name.is_empty() {
            return Err(MetricValidationError::EmptyName);
        }
        if !self.value.is_finite() {
            return Err(MetricValidationError::NonFiniteValue(self.value));
        }
        if self.kind == MetricKind::Counter && self.value < 0.0 {
            return Err(MetricValidationError::NegativeCounterIncrement(self.value));
        }
        self.validate()?;
        Ok(())
    }
}
