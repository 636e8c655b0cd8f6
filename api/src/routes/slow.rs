//! Slow operation demo.
//!
//! Sleeps for a randomized, bounded delay so the tracked request shows up as
//! slow. The delay bounds come from `SLOW_MIN_MS` / `SLOW_MAX_MS`.

use super::metrics::PROCESSING_DURATION;
use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use rand::Rng;
use serde::Serialize;
use shared::models::{Attributes, LogLevel, MetricKind};
use std::time::Duration;

/// Slow demo response.
#[derive(Debug, Serialize)]
pub struct SlowResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// How long the operation slept.
    pub duration_seconds: f64,
}

/// Creates the slow demo routes.
pub fn slow_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/slow", get(demo_slow))
        .with_state(state)
}

async fn demo_slow(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
) -> Json<SlowResponse> {
    let delay_ms = rand::rng().random_range(state.demo().slow_delay_ms.clone());
    #[allow(clippy::cast_precision_loss)]
    let duration_seconds = delay_ms as f64 / 1000.0;

    let mut span = state.telemetry().start_span_in("slow_operation", &request);
    span.set_attribute("operation.duration_seconds", duration_seconds);
    span.emit_log(
        LogLevel::Warning,
        format!("Starting slow operation (will take {duration_seconds:.2}s)"),
        Attributes::new()
            .with("performance_warning", true)
            .with("expected_duration", duration_seconds),
    );

    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    state.telemetry().record_metric(
        PROCESSING_DURATION,
        duration_seconds * 1000.0,
        MetricKind::Histogram,
        Attributes::new().with("operation", "slow_operation"),
    );
    span.emit_log(
        LogLevel::Info,
        "Slow operation completed",
        Attributes::new()
            .with("actual_duration", span.elapsed().num_milliseconds())
            .with("performance_impact", "high"),
    );
    span.set_ok();
    span.end();

    Json(SlowResponse {
        message: "Slow operation completed",
        duration_seconds,
    })
}
