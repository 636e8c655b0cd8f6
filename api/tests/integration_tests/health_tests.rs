//! Integration tests for the banner and health check.
//!
//! Tests cover:
//! - Health check with and without a telemetry backend
//! - Service banner contents

use api::{create_router, AppState};
use axum::http::StatusCode;
use shared::models::SpanKind;
use shared::telemetry::{TelemetryBridge, TelemetryConfig};

use super::common::{get, test_app, test_settings};

#[tokio::test]
async fn test_health_check() {
    let (app, _sink) = test_app();

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "otel-demo");
}

#[tokio::test]
async fn test_health_check_with_unusable_backend() {
    // A malformed connection string must not take the service down.
    let telemetry = TelemetryBridge::initialize(
        TelemetryConfig::new("degraded").with_connection_string("IngestionEndpoint=ftp://nowhere"),
    );
    assert!(!telemetry.is_enabled());
    let app = create_router(AppState::new(telemetry, test_settings()).unwrap());

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["service"], "degraded");
}

#[tokio::test]
async fn test_health_request_is_tracked() {
    let (app, sink) = test_app();
    get(app, "/health").await;

    let span = sink.span_named("GET /health").unwrap();
    assert_eq!(span.kind, SpanKind::Server);
    assert_eq!(span.attributes.get_str("http.route"), Some("/health"));
}

#[tokio::test]
async fn test_root_banner() {
    let (app, sink) = test_app();

    let (status, response) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["message"].is_string());
    assert_eq!(response["endpoints"]["http_errors"], "/demo/http-errors/{code}");
    assert_eq!(sink.logs().len(), 1);
}
