//! API route definitions.
//!
//! This module organizes the demo endpoints. Each submodule exercises one
//! kind of telemetry; [`all`] exercises all of them at once.

mod all;
mod dependency;
mod exceptions;
mod health;
mod http_errors;
mod logs;
mod metrics;
mod slow;
mod traces;

pub use all::all_routes;
pub use dependency::dependency_routes;
pub use exceptions::exceptions_routes;
pub use health::health_routes;
pub use http_errors::http_errors_routes;
pub use logs::logs_routes;
pub use metrics::{
    metrics_routes, ACTIVE_USERS, ERRORS_TOTAL, PROCESSING_DURATION, REQUESTS_TOTAL,
};
pub use slow::slow_routes;
pub use traces::traces_routes;
