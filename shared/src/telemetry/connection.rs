//! Backend connection string parsing.
//!
//! The credential selecting the telemetry backend is a single string of
//! `Key=Value` segments separated by `;`:
//!
//! ```text
//! InstrumentationKey=0000-1111;IngestionEndpoint=https://collector.example.com:4318
//! ```

use std::collections::HashMap;
use thiserror::Error;

/// Endpoint used when the connection string does not name one.
pub const DEFAULT_INGESTION_ENDPOINT: &str = "http://localhost:4318";

/// Errors that can occur while parsing a connection string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionStringError {
    /// The string is empty or only whitespace.
    #[error("Connection string is empty")]
    Empty,

    /// A segment is not of the form `Key=Value`.
    #[error("Malformed connection string segment: {0:?}")]
    MalformedSegment(String),

    /// A required key is absent or has an empty value.
    #[error("Connection string is missing {0}")]
    MissingKey(&'static str),

    /// The ingestion endpoint is not an http(s) URL.
    #[error("Invalid ingestion endpoint: {0}")]
    InvalidEndpoint(String),
}

/// A parsed backend connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    /// Key identifying the telemetry resource in the backend.
    pub instrumentation_key: String,
    /// Base URL of the OTLP/HTTP ingestion endpoint, without trailing slash.
    pub ingestion_endpoint: String,
}

impl ConnectionString {
    /// Parses a connection string.
    ///
    /// Keys are matched case-insensitively and empty segments (such as a
    /// trailing `;`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, a segment lacks `=`, the
    /// instrumentation key is missing, or the endpoint is not an http(s) URL.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::telemetry::ConnectionString;
    ///
    /// let conn = ConnectionString::parse(
    ///     "InstrumentationKey=abc;IngestionEndpoint=https://otel.example.com/",
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(conn.instrumentation_key, "abc");
    /// assert_eq!(conn.ingestion_endpoint, "https://otel.example.com");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let mut pairs = HashMap::new();
        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;
            pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let instrumentation_key = pairs
            .remove("instrumentationkey")
            .filter(|v| !v.is_empty())
            .ok_or(ConnectionStringError::MissingKey("InstrumentationKey"))?;

        let ingestion_endpoint = match pairs.remove("ingestionendpoint") {
            Some(endpoint) if !endpoint.is_empty() => {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(ConnectionStringError::InvalidEndpoint(endpoint));
                }
                endpoint.trim_end_matches('/').to_string()
            }
            _ => DEFAULT_INGESTION_ENDPOINT.to_string(),
        };

        Ok(Self {
            instrumentation_key,
            ingestion_endpoint,
        })
    }

    /// Full URL of the OTLP signal path, e.g. `signal_url("traces")`.
    #[must_use]
    pub fn signal_url(&self, signal: &str) -> String {
        format!("{}/v1/{signal}", self.ingestion_endpoint)
    }
}

impl std::str::FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// The key is a credential; keep it out of logs.
impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("instrumentation_key", &"<redacted>")
            .field("ingestion_endpoint", &self.ingestion_endpoint)
            .finish()
    }
}
