//! Exception tracking demo.
//!
//! The requested failure is actually produced (a checked division by zero, a
//! failed parse, ...), caught, reported as an exception and turned into an
//! error response. Nothing here can panic.

use super::metrics::count_error;
use crate::error::{DemoError, FailureKind, SimulatedFailure};
use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::{Attributes, LogLevel, EXCEPTION_MESSAGE_KEY, EXCEPTION_TYPE_KEY};
use shared::telemetry::{ActiveSpan, TelemetryBridge};

/// Query parameters of the exception demo.
#[derive(Debug, Deserialize)]
pub struct ExceptionParams {
    /// Name of the failure kind to simulate.
    pub error_type: Option<String>,
}

/// Body returned if a simulation unexpectedly succeeds.
#[derive(Debug, Serialize)]
pub struct ExceptionResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// The computed value.
    pub value: i64,
}

/// Creates the exception demo routes.
pub fn exceptions_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/exception", get(demo_exception))
        .with_state(state)
}

/// Runs the operation that fails with the given kind.
pub(crate) fn simulate(kind: FailureKind) -> Result<i64, SimulatedFailure> {
    match kind {
        FailureKind::Runtime => Err(SimulatedFailure::Runtime),
        FailureKind::ZeroDivision => {
            let numerator = 1_i64;
            let divisor = 0_i64;
            numerator
                .checked_div(divisor)
                .ok_or(SimulatedFailure::DivisionByZero { numerator })
        }
        FailureKind::Value => {
            let input = "not-a-number";
            input
                .parse::<i64>()
                .map_err(|e| SimulatedFailure::InvalidValue {
                    input: input.to_string(),
                    reason: e.to_string(),
                })
        }
        FailureKind::Http => Err(SimulatedFailure::ServiceUnavailable),
    }
}

/// Reports a caught failure on `span` and as an exception log.
pub(crate) fn report_failure(
    telemetry: &TelemetryBridge,
    span: &mut ActiveSpan,
    failure: &SimulatedFailure,
    mut attributes: Attributes,
) {
    span.record_exception(failure.exception_type(), failure);
    attributes.insert("error_type", failure.kind().as_str());
    attributes.insert(EXCEPTION_TYPE_KEY, failure.exception_type());
    attributes.insert(EXCEPTION_MESSAGE_KEY, failure.to_string());
    telemetry.emit_log_in(
        &span.context(),
        LogLevel::Error,
        format!("Exception occurred: {}", failure.exception_type()),
        attributes,
    );
}

async fn demo_exception(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
    Query(params): Query<ExceptionParams>,
) -> Result<Json<ExceptionResponse>, DemoError> {
    let requested = params
        .error_type
        .unwrap_or_else(|| FailureKind::DEFAULT.as_str().to_string());
    let kind = FailureKind::parse(&requested).unwrap_or(FailureKind::DEFAULT);
    let fallback = kind.as_str() != requested;
    if fallback {
        tracing::debug!(requested = %requested, "Unknown error type, using default");
    }

    count_error(state.telemetry(), kind.as_str(), "/demo/exception");

    let mut span = state.telemetry().start_span_in("simulated_failure", &request);
    span.set_attribute("error.kind", kind.as_str());
    span.set_attribute("error.requested", requested.as_str());
    span.set_attribute("error.fallback", fallback);

    match simulate(kind) {
        Ok(value) => Ok(Json(ExceptionResponse {
            message: "Operation unexpectedly succeeded",
            value,
        })),
        Err(failure) => {
            report_failure(
                state.telemetry(),
                &mut span,
                &failure,
                Attributes::new().with("requested_error_type", requested.as_str()),
            );
            span.set_error(failure.to_string());
            Err(failure.into())
        }
    }
}
