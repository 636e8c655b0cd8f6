//! Composite demo producing every kind of telemetry in one transaction.

use super::dependency::call_dependency;
use super::exceptions::{report_failure, simulate};
use super::metrics::{count_error, record_demo_metrics};
use crate::error::FailureKind;
use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use shared::models::{Attributes, LogLevel};
use std::time::Duration;

/// Path fetched by the composite demo.
pub const USER_PATH: &str = "/users/1";

const SUB_OPERATION_WORK: Duration = Duration::from_millis(100);

/// Composite demo response.
#[derive(Debug, Serialize)]
pub struct AllResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// One line per telemetry item produced.
    pub telemetry_generated: Vec<String>,
    /// Number of telemetry items produced.
    pub total_types: usize,
    /// Trace every item belongs to.
    pub trace_id: String,
}

/// Creates the composite demo routes.
pub fn all_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/all", get(demo_all))
        .with_state(state)
}

async fn demo_all(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
) -> Json<AllResponse> {
    let telemetry = state.telemetry();
    let mut span = telemetry.start_span_in("comprehensive_demo", &request);
    span.set_attribute("demo.type", "comprehensive");
    let mut results = Vec::new();

    span.emit_log(
        LogLevel::Info,
        "Comprehensive demo started",
        Attributes::new().with("demo_id", "all_telemetry"),
    );
    results.push("✓ INFO log".to_string());

    span.emit_log(
        LogLevel::Warning,
        "This is part of the comprehensive demo",
        Attributes::new().with("warning_level", "informational"),
    );
    results.push("✓ WARNING log".to_string());

    record_demo_metrics(telemetry, "/demo/all", 250.0, 1);
    results.push("✓ Custom metrics (counter, histogram, gauge)".to_string());

    {
        let mut sub = span.child("demo_sub_operation");
        sub.add_event("Sub-operation started", Attributes::new());
        tokio::time::sleep(SUB_OPERATION_WORK).await;
        sub.set_attribute("records_processed", 42);
        sub.add_event("Sub-operation completed", Attributes::new());
    }
    results.push("✓ Custom nested trace".to_string());

    let dependency = call_dependency(&state, &span.context(), USER_PATH).await;
    span.set_attribute("dependency.called", true);
    span.set_attribute("dependency.success", dependency.success);
    results.push(match dependency.status_code {
        Some(code) if dependency.success => format!("✓ Dependency tracking (status: {code})"),
        _ => "✗ Dependency tracking (failed)".to_string(),
    });

    span.emit_log(
        LogLevel::Error,
        "Simulated error for demo purposes",
        Attributes::new()
            .with("is_demo", true)
            .with("error_code", "DEMO_ERR"),
    );
    count_error(telemetry, "simulated", "/demo/all");
    results.push("✓ ERROR log".to_string());

    if let Err(failure) = simulate(FailureKind::Value) {
        report_failure(
            telemetry,
            &mut span,
            &failure,
            Attributes::new().with("demo_id", "all_telemetry"),
        );
        results.push("✓ Exception (caught and logged)".to_string());
    }

    span.emit_log(
        LogLevel::Info,
        "Comprehensive demo completed",
        Attributes::new().with("telemetry_types_generated", results.len()),
    );
    let trace_id = span.context().trace_id;
    span.set_ok();
    span.end();

    Json(AllResponse {
        message: "All telemetry types generated successfully!",
        total_types: results.len(),
        telemetry_generated: results,
        trace_id,
    })
}
