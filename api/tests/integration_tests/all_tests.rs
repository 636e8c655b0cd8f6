//! Integration tests for the composite demo.

use axum::http::StatusCode;
use shared::models::{MetricKind, SpanRecord, SpanStatus, TelemetryKind};
use std::collections::HashSet;

use super::common::{get, test_app};

#[tokio::test]
async fn test_all_produces_every_kind_in_one_transaction() {
    let (app, sink) = test_app();
    let (status, response) = get(app, "/demo/all").await;
    assert_eq!(status, StatusCode::OK);

    let demo = sink.span_named("comprehensive_demo").unwrap();
    let request = sink.span_named("GET /demo/all").unwrap();
    assert_eq!(demo.parent_span_id.as_deref(), Some(request.span_id.as_str()));

    let spans: Vec<SpanRecord> = sink
        .spans()
        .into_iter()
        .filter(|s| s.trace_id == demo.trace_id)
        .collect();
    let mut kinds: HashSet<TelemetryKind> = spans.iter().map(SpanRecord::telemetry_kind).collect();
    for log in sink.logs() {
        assert_eq!(log.trace_id.as_deref(), Some(demo.trace_id.as_str()));
        kinds.insert(log.telemetry_kind());
    }

    for kind in [
        TelemetryKind::Request,
        TelemetryKind::Dependency,
        TelemetryKind::Span,
        TelemetryKind::Log,
        TelemetryKind::Exception,
    ] {
        assert!(kinds.contains(&kind), "missing {kind:?}");
    }

    let metric_kinds: HashSet<MetricKind> = sink.metrics().iter().map(|m| m.kind).collect();
    assert_eq!(metric_kinds.len(), 3);

    assert_eq!(response["total_types"], 7);
    assert_eq!(
        response["telemetry_generated"].as_array().unwrap().len(),
        7
    );
}

#[tokio::test]
async fn test_all_nests_every_span_under_demo_span() {
    let (app, sink) = test_app();
    get(app, "/demo/all").await;

    let demo = sink.span_named("comprehensive_demo").unwrap();
    for name in ["demo_sub_operation", "external_api_call"] {
        let span = sink.span_named(name).unwrap();
        assert_eq!(span.parent_span_id.as_deref(), Some(demo.span_id.as_str()), "{name}");
    }

    // A caught exception is recorded without failing the demo.
    assert_eq!(demo.status, SpanStatus::Ok);
    assert!(demo.has_event("exception"));
}
