//! Service banner and health check endpoints.
//!
//! `/health` is intended for load balancers and monitoring systems; it never
//! depends on the telemetry backend being reachable.

use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{Attributes, LogLevel};
use std::collections::BTreeMap;

/// Endpoints advertised by the service banner.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("health", "/health"),
    ("info_log", "/demo/info"),
    ("warning_log", "/demo/warning"),
    ("error_log", "/demo/error"),
    ("exception", "/demo/exception?error_type=runtime|zero_division|value|http"),
    ("metrics", "/demo/metrics"),
    ("custom_trace", "/demo/trace"),
    ("dependency", "/demo/dependency"),
    ("slow_operation", "/demo/slow"),
    ("http_errors", "/demo/http-errors/{code}"),
    ("user_context", "/demo/user-context?user_id=&action="),
    ("all_telemetry", "/demo/all"),
];

/// Service banner response.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    /// Greeting.
    pub message: &'static str,
    /// Whether telemetry is exported to a backend.
    pub telemetry_enabled: bool,
    /// Endpoint name to path.
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "healthy" if reachable).
    pub status: &'static str,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: &'static str,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
}

/// Creates the banner and health check routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn root(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
) -> Json<RootResponse> {
    state.telemetry().emit_log_in(
        &request,
        LogLevel::Info,
        "Root endpoint accessed",
        Attributes::new().with("user_action", "view_home"),
    );

    Json(RootResponse {
        message: "Hello from the OpenTelemetry demo service!",
        telemetry_enabled: state.telemetry().is_enabled(),
        endpoints: ENDPOINTS.iter().copied().collect(),
    })
}

/// Health check handler.
///
/// Returns a simple JSON response indicating the service is healthy.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    tracing::debug!("Health check performed");
    Json(HealthResponse {
        status: "healthy",
        service: state.telemetry().service().to_string(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}
