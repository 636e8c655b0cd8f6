//! Integration tests for the nested span and slow operation demos.

use axum::http::StatusCode;
use shared::models::{SpanKind, SpanStatus};

use super::common::{get, test_app};

#[tokio::test]
async fn test_child_span_parent_is_outer_span() {
    let (app, sink) = test_app();
    let (status, response) = get(app, "/demo/trace").await;
    assert_eq!(status, StatusCode::OK);

    let outer = sink.span_named("custom_operation").unwrap();
    let child = sink.span_named("sub_operation").unwrap();

    assert_eq!(child.parent_span_id.as_deref(), Some(outer.span_id.as_str()));
    assert_eq!(child.trace_id, outer.trace_id);
    assert_eq!(response["trace_id"], outer.trace_id);
    assert!(child.end_time <= outer.end_time);
    assert!(!outer.attributes.is_empty());
    assert!(!child.attributes.is_empty());
    assert!(child.has_event("Processing started"));
}

#[tokio::test]
async fn test_trace_nests_under_request() {
    let (app, sink) = test_app();
    get(app, "/demo/trace").await;

    let request = sink.span_named("GET /demo/trace").unwrap();
    let outer = sink.span_named("custom_operation").unwrap();
    assert_eq!(request.kind, SpanKind::Server);
    assert!(request.is_root());
    assert_eq!(outer.parent_span_id.as_deref(), Some(request.span_id.as_str()));

    let logs = sink.logs();
    assert_eq!(logs[0].span_id.as_deref(), Some(outer.span_id.as_str()));
}

#[tokio::test]
async fn test_slow_operation() {
    let (app, sink) = test_app();
    let (status, response) = get(app, "/demo/slow").await;
    assert_eq!(status, StatusCode::OK);

    let seconds = response["duration_seconds"].as_f64().unwrap();
    assert!(seconds > 0.0);

    let span = sink.span_named("slow_operation").unwrap();
    assert_eq!(span.status, SpanStatus::Ok);
    assert!(span.duration().num_milliseconds() >= 10);

    let request = sink.span_named("GET /demo/slow").unwrap();
    assert!(request.duration() >= span.duration());
}
