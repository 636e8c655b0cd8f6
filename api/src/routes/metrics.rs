//! Custom metrics demo.
//!
//! Also owns the names of every instrument the service records so that the
//! other demos report into the same series.

use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use rand::Rng;
use serde::Serialize;
use shared::models::{Attributes, LogLevel, MetricKind};
use shared::telemetry::TelemetryBridge;

/// Counter of demo requests.
pub const REQUESTS_TOTAL: &str = "demo.requests.total";
/// Histogram of simulated processing time, in milliseconds.
pub const PROCESSING_DURATION: &str = "demo.processing.duration";
/// Gauge of simulated active users.
pub const ACTIVE_USERS: &str = "demo.active_users";
/// Counter of logged and simulated errors.
pub const ERRORS_TOTAL: &str = "demo.errors.total";

/// Values recorded by one metrics demo call.
#[derive(Debug, Serialize)]
pub struct RecordedMetrics {
    /// Counter increment.
    pub request_count: &'static str,
    /// Histogram observation.
    pub processing_time_ms: f64,
    /// Gauge value.
    pub active_users: u32,
}

/// Metrics demo response.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// What was recorded.
    pub metrics: RecordedMetrics,
}

/// Creates the metrics demo routes.
pub fn metrics_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/metrics", get(demo_metrics))
        .with_state(state)
}

/// Records one sample on each of the three demo instruments.
pub(crate) fn record_demo_metrics(
    telemetry: &TelemetryBridge,
    endpoint: &str,
    processing_time_ms: f64,
    active_users: u32,
) {
    telemetry.record_metric(
        REQUESTS_TOTAL,
        1.0,
        MetricKind::Counter,
        Attributes::new()
            .with("endpoint", endpoint)
            .with("method", "GET"),
    );
    telemetry.record_metric(
        PROCESSING_DURATION,
        processing_time_ms,
        MetricKind::Histogram,
        Attributes::new().with("endpoint", endpoint),
    );
    telemetry.record_metric(
        ACTIVE_USERS,
        f64::from(active_users),
        MetricKind::Gauge,
        Attributes::new().with("region", "us-east"),
    );
}

/// Increments the error counter.
pub(crate) fn count_error(telemetry: &TelemetryBridge, error_type: &str, endpoint: &str) {
    telemetry.record_metric(
        ERRORS_TOTAL,
        1.0,
        MetricKind::Counter,
        Attributes::new()
            .with("error_type", error_type)
            .with("endpoint", endpoint),
    );
}

async fn demo_metrics(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
) -> Json<MetricsResponse> {
    let (processing_time_ms, active_users) = {
        let mut rng = rand::rng();
        (
            rng.random_range(10.0..=500.0),
            rng.random_range(1..=100_u32),
        )
    };
    let processing_time_ms = (processing_time_ms * 100.0_f64).round() / 100.0;

    record_demo_metrics(
        state.telemetry(),
        "/demo/metrics",
        processing_time_ms,
        active_users,
    );
    state.telemetry().emit_log_in(
        &request,
        LogLevel::Info,
        format!(
            "Custom metrics recorded: processing_time={processing_time_ms:.2}ms, active_users={active_users}"
        ),
        Attributes::new()
            .with("processing_time_ms", processing_time_ms)
            .with("active_users", active_users),
    );

    Json(MetricsResponse {
        message: "Custom metrics sent to the telemetry backend",
        metrics: RecordedMetrics {
            request_count: "+1",
            processing_time_ms,
            active_users,
        },
    })
}
