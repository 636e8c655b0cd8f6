//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup and HTTP request helpers. Telemetry lands in an
//! in-memory sink and the outbound dependency points at a closed local port,
//! so no test needs the network.

use api::{create_router, AppState, DemoSettings};
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shared::telemetry::InMemorySink;
use std::sync::Arc;
use std::time::Duration;

/// Base URL nothing listens on (the discard port).
pub const UNREACHABLE_DEPENDENCY: &str = "http://127.0.0.1:9";

/// Demo settings that never leave the machine and keep the slow demo short.
pub fn test_settings() -> DemoSettings {
    DemoSettings {
        dependency_url: UNREACHABLE_DEPENDENCY.to_string(),
        dependency_timeout: Duration::from_secs(1),
        slow_delay_ms: 10..=30,
    }
}

/// Creates a test router backed by a fresh in-memory sink.
///
/// # Returns
///
/// A tuple containing the configured router and the sink receiving its telemetry.
pub fn test_app() -> (Router, Arc<InMemorySink>) {
    let (state, sink) = AppState::with_in_memory_telemetry(test_settings()).unwrap();
    (create_router(state), sink)
}

/// Helper to make a GET request.
///
/// # Arguments
///
/// * `app` - The Axum router to send the request to
/// * `uri` - The URI path to GET from
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _headers, json) = get_with_headers(app, uri).await;
    (status, json)
}

/// Like [`get`], also returning the response headers.
pub async fn get_with_headers(app: Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, headers, json)
}
