//! Integration tests for the external dependency demo.
//!
//! The dependency points at a closed local port, so every call here fails.

use axum::http::StatusCode;
use shared::models::{SpanKind, SpanStatus, TelemetryKind};

use super::common::{get, test_app};

#[tokio::test]
async fn test_failed_dependency_still_returns_200() {
    let (app, _sink) = test_app();
    let (status, response) = get(app, "/demo/dependency").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["dependency"]["success"], false);
    assert!(response["dependency"]["error"].is_string());
    assert_eq!(response["external_api"], "127.0.0.1");
    assert!(response.get("data").is_none());
}

#[tokio::test]
async fn test_failed_dependency_is_recorded() {
    let (app, sink) = test_app();
    get(app, "/demo/dependency").await;

    let span = sink.span_named("external_api_call").unwrap();
    assert_eq!(span.kind, SpanKind::Client);
    assert_eq!(span.telemetry_kind(), TelemetryKind::Dependency);
    assert_eq!(span.status, SpanStatus::Error);
    assert_eq!(span.attributes.get_str("dependency.target"), Some("127.0.0.1"));
    assert_eq!(
        span.attributes.get_str("url.full"),
        Some("http://127.0.0.1:9/posts/1")
    );
    assert!(span.attributes.contains_key("duration_ms"));

    // The failed dependency does not fail the request itself.
    let request = sink.span_named("GET /demo/dependency").unwrap();
    assert_eq!(request.status, SpanStatus::Ok);
    assert_eq!(span.parent_span_id.as_deref(), Some(request.span_id.as_str()));
}
