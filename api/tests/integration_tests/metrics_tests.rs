//! Integration tests for the custom metrics demo.

use api::{ACTIVE_USERS, PROCESSING_DURATION, REQUESTS_TOTAL};
use axum::http::StatusCode;
use shared::models::MetricKind;

use super::common::{get, test_app};

#[tokio::test]
async fn test_exactly_one_sample_per_instrument_kind() {
    let (app, sink) = test_app();
    let (status, response) = get(app, "/demo/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["metrics"]["request_count"], "+1");

    let metrics = sink.metrics();
    assert_eq!(metrics.len(), 3);

    let counter: Vec<_> = metrics.iter().filter(|m| m.kind == MetricKind::Counter).collect();
    let histogram: Vec<_> = metrics.iter().filter(|m| m.kind == MetricKind::Histogram).collect();
    let gauge: Vec<_> = metrics.iter().filter(|m| m.kind == MetricKind::Gauge).collect();
    assert_eq!(counter.len(), 1);
    assert_eq!(histogram.len(), 1);
    assert_eq!(gauge.len(), 1);

    assert_eq!(counter[0].name, REQUESTS_TOTAL);
    assert!((counter[0].value - 1.0).abs() < f64::EPSILON);
    assert_eq!(histogram[0].name, PROCESSING_DURATION);
    assert!((10.0..=500.0).contains(&histogram[0].value));
    assert_eq!(gauge[0].name, ACTIVE_USERS);
    assert!((1.0..=100.0).contains(&gauge[0].value));
}

#[tokio::test]
async fn test_repeated_calls_accumulate() {
    let (app, sink) = test_app();
    for _ in 0..3 {
        get(app.clone(), "/demo/metrics").await;
    }

    let counters = sink
        .metrics()
        .into_iter()
        .filter(|m| m.name == REQUESTS_TOTAL)
        .count();
    assert_eq!(counters, 3);
    assert_eq!(sink.logs().len(), 3);
}
