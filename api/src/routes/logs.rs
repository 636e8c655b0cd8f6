//! Log level and user context demos.

use super::metrics::count_error;
use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::{Attributes, LogLevel};

/// Response of the log level demos.
#[derive(Debug, Serialize)]
pub struct LogResponse {
    /// Human-readable summary.
    pub message: String,
    /// Backend severity number of the emitted record.
    pub severity: u8,
    /// Set by the error demo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_logged: Option<bool>,
}

/// Query parameters of the user context demo.
#[derive(Debug, Deserialize)]
pub struct UserContextParams {
    /// Caller identifier.
    pub user_id: Option<String>,
    /// Action performed by the caller.
    pub action: Option<String>,
}

/// Response of the user context demo.
#[derive(Debug, Serialize)]
pub struct UserContextResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// Identifier attached to the log.
    pub user_id: String,
    /// Action attached to the log.
    pub action: String,
}

/// Creates the log demo routes.
pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/info", get(demo_info))
        .route("/demo/warning", get(demo_warning))
        .route("/demo/error", get(demo_error))
        .route("/demo/user-context", get(demo_user_context))
        .with_state(state)
}

fn emit(
    state: &AppState,
    request: &RequestSpan,
    level: LogLevel,
    message: &str,
    attributes: Attributes,
) -> LogResponse {
    state
        .telemetry()
        .emit_log_in(&request.0, level, message, attributes);
    LogResponse {
        message: format!("{} log sent to the telemetry backend", level.as_str().to_uppercase()),
        severity: level.severity(),
        error_logged: None,
    }
}

async fn demo_info(
    State(state): State<AppState>,
    Extension(request): Extension<RequestSpan>,
) -> Json<LogResponse> {
    Json(emit(
        &state,
        &request,
        LogLevel::Info,
        "This is an informational message",
        Attributes::new()
            .with("event_type", "user_action")
            .with("action", "demo_info")
            .with("user_id", "user123"),
    ))
}

async fn demo_warning(
    State(state): State<AppState>,
    Extension(request): Extension<RequestSpan>,
) -> Json<LogResponse> {
    Json(emit(
        &state,
        &request,
        LogLevel::Warning,
        "This is a warning message - something unusual happened",
        Attributes::new()
            .with("warning_type", "unusual_behavior")
            .with("severity", "medium")
            .with("component", "demo_service"),
    ))
}

async fn demo_error(
    State(state): State<AppState>,
    Extension(request): Extension<RequestSpan>,
) -> Json<LogResponse> {
    count_error(state.telemetry(), "logged_error", "/demo/error");
    let mut response = emit(
        &state,
        &request,
        LogLevel::Error,
        "This is an error message - operation failed",
        Attributes::new()
            .with("error_code", "ERR_001")
            .with("operation", "data_processing")
            .with("retry_count", 3),
    );
    response.error_logged = Some(true);
    Json(response)
}

async fn demo_user_context(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
    Query(params): Query<UserContextParams>,
) -> Json<UserContextResponse> {
    let user_id = params.user_id.unwrap_or_else(|| "anonymous".to_string());
    let action = params.action.unwrap_or_else(|| "view".to_string());

    state.telemetry().emit_log_in(
        &request,
        LogLevel::Info,
        format!("User {user_id} performed {action}"),
        Attributes::new()
            .with("user_id", &user_id)
            .with("action", &action),
    );

    Json(UserContextResponse {
        message: "User context log sent to the telemetry backend",
        user_id,
        action,
    })
}
