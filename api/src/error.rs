//! Handler error types.
//!
//! Every failure a handler can produce is a [`DemoError`], which renders as
//! a JSON body with a matching status code. No handler error is fatal.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kinds of failure the exception demo can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A generic runtime failure.
    Runtime,
    /// An integer division by zero.
    ZeroDivision,
    /// A value that fails to parse.
    Value,
    /// A downstream service reported as unavailable.
    Http,
}

impl FailureKind {
    /// Kind used when the requested name is missing or unknown.
    pub const DEFAULT: Self = Self::Runtime;

    /// All supported kinds.
    pub const ALL: [Self; 4] = [Self::Runtime, Self::ZeroDivision, Self::Value, Self::Http];

    /// Looks up a kind by its query-string name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Query-string name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::ZeroDivision => "zero_division",
            Self::Value => "value",
            Self::Http => "http",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deliberately triggered application failure.
#[derive(Debug, Error)]
pub enum SimulatedFailure {
    /// Generic runtime failure.
    #[error("This is a simulated runtime error for testing")]
    Runtime,

    /// Integer division by zero.
    #[error("attempt to divide {numerator} by zero")]
    DivisionByZero {
        /// The dividend.
        numerator: i64,
    },

    /// A value that could not be parsed.
    #[error("invalid value {input:?}: {reason}")]
    InvalidValue {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A downstream service is unavailable.
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

impl SimulatedFailure {
    /// The kind this failure belongs to.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Runtime => FailureKind::Runtime,
            Self::DivisionByZero { .. } => FailureKind::ZeroDivision,
            Self::InvalidValue { .. } => FailureKind::Value,
            Self::ServiceUnavailable => FailureKind::Http,
        }
    }

    /// Name reported as `exception.type`.
    #[must_use]
    pub fn exception_type(&self) -> &'static str {
        match self {
            Self::Runtime => "RuntimeError",
            Self::DivisionByZero { .. } => "DivisionByZeroError",
            Self::InvalidValue { .. } => "ValueError",
            Self::ServiceUnavailable => "ServiceUnavailableError",
        }
    }

    /// HTTP status the failure is surfaced with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error name.
    pub error: String,
    /// HTTP status code.
    pub status_code: u16,
    /// Human-readable description.
    pub detail: String,
    /// Simulated failure kind, for exception demo responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

/// Errors returned by demo handlers.
#[derive(Debug, Error)]
pub enum DemoError {
    /// A caught simulated failure.
    #[error(transparent)]
    Simulated(#[from] SimulatedFailure),

    /// A status code echoed on purpose.
    #[error("{status}: {detail}")]
    Status {
        /// The status to return.
        status: StatusCode,
        /// Human-readable description.
        detail: String,
    },
}

impl DemoError {
    /// The HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Simulated(failure) => failure.status(),
            Self::Status { status, .. } => *status,
        }
    }
}

impl IntoResponse for DemoError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Simulated(failure) => ErrorBody {
                error: status
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_string(),
                status_code: status.as_u16(),
                detail: format!("Internal error: {failure}"),
                error_type: Some(failure.kind()),
            },
            Self::Status { detail, .. } => ErrorBody {
                error: status.canonical_reason().unwrap_or("Error").to_string(),
                status_code: status.as_u16(),
                detail: detail.clone(),
                error_type: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();
        match status {
            StatusCode::UNAUTHORIZED => {
                headers.insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer realm=\"otel-demo\""),
                );
            }
            StatusCode::TOO_MANY_REQUESTS => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from_static("30"));
            }
            _ => {}
        }
        response
    }
}
