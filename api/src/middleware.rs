//! Request tracking.
//!
//! Every request handled by the router is recorded as a `Server` span, the
//! equivalent of a "request" item in the telemetry backend. Handlers find the
//! span's context in the [`RequestSpan`] extension and nest their own spans
//! and logs under it.
//!
//! A handler panic is turned into a JSON 500 by [`PanicResponder`] before it
//! reaches the tracking layer, so the request is still recorded as failed.

use crate::error::ErrorBody;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::models::{Attributes, LogLevel, SpanKind, EXCEPTION_MESSAGE_KEY, EXCEPTION_TYPE_KEY};
use shared::telemetry::{SpanContext, TelemetryBridge};
use std::any::Any;
use std::time::Instant;
use tower_http::catch_panic::ResponseForPanic;

/// Context of the span tracking the current request.
#[derive(Debug, Clone)]
pub struct RequestSpan(pub SpanContext);

/// Wraps one request in a `Server` span.
///
/// The span is named `"{METHOD} {route}"` using the matched route template
/// so that `/demo/http-errors/404` and `/demo/http-errors/500` aggregate
/// under one operation. A status of 400 or above marks the request as failed.
pub async fn track_requests(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| path.clone(), |matched| matched.as_str().to_string());

    let mut span = state.telemetry().start_span_with_kind(
        format!("{method} {route}"),
        SpanKind::Server,
        None,
    );
    span.set_attribute("http.request.method", method.as_str());
    span.set_attribute("url.path", path.as_str());
    span.set_attribute("http.route", route.as_str());
    request
        .extensions_mut()
        .insert(RequestSpan(span.context()));

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed();

    let status = response.status();
    let success = status.as_u16() < 400;
    span.set_attribute("http.response.status_code", status.as_u16());
    span.set_attribute("success", success);
    span.set_attribute("duration_ms", elapsed.as_secs_f64() * 1000.0);
    if success {
        span.set_ok();
    } else {
        span.set_error(format!("HTTP {}", status.as_u16()));
    }
    span.end();

    tracing::debug!(
        method = %method,
        route = %route,
        status = status.as_u16(),
        success,
        "Request tracked"
    );

    response
}

/// Renders a caught handler panic as a JSON 500 and reports it.
#[derive(Clone)]
pub struct PanicResponder {
    telemetry: TelemetryBridge,
}

impl PanicResponder {
    /// Creates a responder reporting through `telemetry`.
    #[must_use]
    pub fn new(telemetry: TelemetryBridge) -> Self {
        Self { telemetry }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = panic_message(err.as_ref());
        self.telemetry.emit_log(
            LogLevel::Critical,
            "Unhandled handler panic",
            Attributes::new()
                .with(EXCEPTION_TYPE_KEY, "panic")
                .with(EXCEPTION_MESSAGE_KEY, message.as_str()),
        );

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = ErrorBody {
            error: "Internal Server Error".to_string(),
            status_code: status.as_u16(),
            detail: "An unexpected error occurred".to_string(),
            error_type: None,
        };
        (status, Json(body)).into_response()
    }
}
