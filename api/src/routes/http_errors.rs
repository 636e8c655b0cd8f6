//! HTTP error status demo.
//!
//! Echoes one of a fixed set of error statuses so the request tracking
//! records a failed request with that status. Any other code, numeric or
//! not, falls back to 500.

use crate::error::DemoError;
use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Router,
};
use shared::models::{Attributes, LogLevel};

/// Status used for unsupported codes.
pub const FALLBACK_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Supported statuses and their descriptions.
pub const SUPPORTED: [(StatusCode, &str); 7] = [
    (
        StatusCode::BAD_REQUEST,
        "The request was malformed or had invalid parameters",
    ),
    (
        StatusCode::UNAUTHORIZED,
        "Authentication is required to access this resource",
    ),
    (
        StatusCode::FORBIDDEN,
        "You do not have permission to access this resource",
    ),
    (StatusCode::NOT_FOUND, "The requested resource was not found"),
    (
        StatusCode::TOO_MANY_REQUESTS,
        "Rate limit exceeded, retry after the indicated delay",
    ),
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unexpected error occurred on the server",
    ),
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "The service is temporarily unavailable",
    ),
];

/// Creates the HTTP error demo routes.
pub fn http_errors_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/http-errors/{code}", get(demo_http_error))
        .with_state(state)
}

/// Resolves a requested code to a supported status.
///
/// Returns the status, its description and whether the fallback was used.
#[must_use]
pub fn resolve(requested: &str) -> (StatusCode, &'static str, bool) {
    let matched = requested
        .trim()
        .parse::<u16>()
        .ok()
        .and_then(|code| SUPPORTED.iter().find(|(status, _)| status.as_u16() == code));

    match matched {
        Some((status, detail)) => (*status, detail, false),
        None => {
            let detail = SUPPORTED
                .iter()
                .find(|(status, _)| *status == FALLBACK_STATUS)
                .map_or("An unexpected error occurred on the server", |(_, d)| d);
            (FALLBACK_STATUS, detail, true)
        }
    }
}

async fn demo_http_error(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
    Path(requested): Path<String>,
) -> DemoError {
    let (status, detail, fallback) = resolve(&requested);
    let level = if status.is_server_error() {
        LogLevel::Error
    } else {
        LogLevel::Warning
    };

    state.telemetry().emit_log_in(
        &request,
        level,
        format!("Simulated HTTP {} response", status.as_u16()),
        Attributes::new()
            .with("status_code", status.as_u16())
            .with("requested_code", requested.as_str())
            .with("fallback", fallback),
    );

    let detail = if fallback {
        format!("Unsupported status code {requested:?}; {detail}")
    } else {
        detail.to_string()
    };
    DemoError::Status { status, detail }
}
