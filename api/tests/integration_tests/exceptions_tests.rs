//! Integration tests for the exception demo.

use api::ERRORS_TOTAL;
use axum::http::StatusCode;
use shared::models::{SpanStatus, TelemetryKind, EXCEPTION_TYPE_KEY};

use super::common::{get, test_app};

#[tokio::test]
async fn test_known_error_types() {
    for (error_type, expected_status, exception_type) in [
        ("runtime", StatusCode::INTERNAL_SERVER_ERROR, "RuntimeError"),
        ("zero_division", StatusCode::INTERNAL_SERVER_ERROR, "DivisionByZeroError"),
        ("value", StatusCode::INTERNAL_SERVER_ERROR, "ValueError"),
        ("http", StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailableError"),
    ] {
        let (app, sink) = test_app();
        let (status, response) =
            get(app, &format!("/demo/exception?error_type={error_type}")).await;

        assert_eq!(status, expected_status, "{error_type}");
        assert!(status.is_server_error());
        assert_eq!(response["error_type"], error_type);
        assert!(response["detail"].is_string());

        let logs = sink.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].telemetry_kind(), TelemetryKind::Exception);
        assert_eq!(logs[0].attributes.get_str("error_type"), Some(error_type));
        assert_eq!(
            logs[0].attributes.get_str(EXCEPTION_TYPE_KEY),
            Some(exception_type)
        );
    }
}

#[tokio::test]
async fn test_missing_error_type_uses_default() {
    let (app, _sink) = test_app();
    let (status, response) = get(app, "/demo/exception").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error_type"], "runtime");
    assert!(response["detail"].as_str().unwrap().to_lowercase().contains("error"));
}

#[tokio::test]
async fn test_unknown_error_type_falls_back_to_default() {
    let (app, sink) = test_app();
    let (status, response) = get(app, "/demo/exception?error_type=segfault").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error_type"], "runtime");

    let span = sink.span_named("simulated_failure").unwrap();
    assert_eq!(span.attributes.get_str("error.requested"), Some("segfault"));
    assert_eq!(span.status, SpanStatus::Error);
    assert_eq!(
        sink.logs()[0].attributes.get_str("requested_error_type"),
        Some("segfault")
    );
}

#[tokio::test]
async fn test_exception_counts_error_and_fails_request() {
    let (app, sink) = test_app();
    get(app, "/demo/exception?error_type=value").await;

    let metrics = sink.metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].name, ERRORS_TOTAL);
    assert_eq!(metrics[0].attributes.get_str("error_type"), Some("value"));

    let request = sink.span_named("GET /demo/exception").unwrap();
    assert_eq!(request.status, SpanStatus::Error);
}

#[tokio::test]
async fn test_service_survives_every_failure() {
    let (app, _sink) = test_app();
    for error_type in ["runtime", "zero_division", "value", "http", "???"] {
        get(app.clone(), &format!("/demo/exception?error_type={error_type}")).await;
    }
    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
