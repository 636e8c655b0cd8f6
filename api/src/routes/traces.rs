//! Nested span demo.

use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use rand::Rng;
use serde::Serialize;
use shared::models::{Attributes, LogLevel};
use shared::telemetry::SpanContext;
use std::time::Duration;

const OUTER_WORK: Duration = Duration::from_millis(100);
const INNER_WORK: Duration = Duration::from_millis(50);

/// Trace demo response.
#[derive(Debug, Serialize)]
pub struct TraceResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// Trace all spans belong to.
    pub trace_id: String,
    /// The outer span.
    pub parent_span_id: String,
    /// The nested span.
    pub child_span_id: String,
    /// Simulated records processed by the nested span.
    pub records_processed: u32,
}

/// Creates the trace demo routes.
pub fn traces_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/trace", get(demo_trace))
        .with_state(state)
}

async fn demo_trace(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
) -> Json<TraceResponse> {
    let mut span = state.telemetry().start_span_in("custom_operation", &request);
    span.set_attribute("operation.type", "demo");
    span.set_attribute("user.id", "user456");
    span.set_attribute("custom.property", "example_value");
    let parent = span.context();

    tokio::time::sleep(OUTER_WORK).await;

    let (child, records_processed) = {
        let data_size = rand::rng().random_range(100..=1000_u32);
        let mut child = span.child("sub_operation");
        child.set_attribute("sub_task", "data_processing");
        tokio::time::sleep(INNER_WORK).await;
        child.add_event("Processing started", Attributes::new());
        child.set_attribute("data.size", data_size);
        child.add_event(
            "Processing completed",
            Attributes::new().with("records_processed", data_size),
        );
        (child.context(), data_size)
    };

    span.add_event("Operation completed successfully", Attributes::new());
    span.emit_log(
        LogLevel::Info,
        "Custom trace with nested spans created",
        Attributes::new().with("span_count", 2),
    );
    span.set_ok();
    span.end();

    Json(response(parent, child, records_processed))
}

fn response(parent: SpanContext, child: SpanContext, records_processed: u32) -> TraceResponse {
    TraceResponse {
        message: "Custom trace with nested spans sent to the telemetry backend",
        trace_id: parent.trace_id,
        parent_span_id: parent.span_id,
        child_span_id: child.span_id,
        records_processed,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DemoSettings;
    use crate::create_router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_child_span_is_nested_under_outer_span() {
        let (state, sink) = AppState::with_in_memory_telemetry(DemoSettings::default()).unwrap();
        let response = create_router(state)
            .oneshot(Request::builder().uri("/demo/trace").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let outer = sink.span_named("custom_operation").unwrap();
        let inner = sink.span_named("sub_operation").unwrap();
        let request = sink.span_named("GET /demo/trace").unwrap();

        assert_eq!(inner.parent_span_id.as_deref(), Some(outer.span_id.as_str()));
        assert_eq!(outer.parent_span_id.as_deref(), Some(request.span_id.as_str()));
        assert_eq!(inner.trace_id, outer.trace_id);
        assert!(inner.has_event("Processing completed"));
        assert_eq!(outer.attributes.get_str("operation.type"), Some("demo"));
        assert!(inner.attributes.contains_key("data.size"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["parent_span_id"], outer.span_id);
        assert_eq!(json["child_span_id"], inner.span_id);
    }
}
