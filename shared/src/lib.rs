//! OTel Demo Shared Library
//!
//! Telemetry record models and the telemetry bridge used by the demo API.
//!
//! # Modules
//!
//! - [`models`] - Log records, metric samples, spans and their attributes
//! - [`telemetry`] - The bridge, its sinks and the backend connection string
//!
//! # Example
//!
//! ```
//! use shared::models::{Attributes, LogLevel};
//! use shared::telemetry::TelemetryBridge;
//!
//! let bridge = TelemetryBridge::disabled("auth-service");
//! let span = bridge.start_span("login");
//! span.emit_log(LogLevel::Info, "User logged in", Attributes::new().with("user_id", "12345"));
//! span.end();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod models;
pub mod telemetry;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
