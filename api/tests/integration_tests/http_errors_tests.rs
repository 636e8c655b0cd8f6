//! Integration tests for the HTTP error status demo.

use axum::http::{header, StatusCode};
use shared::models::{AttributeValue, SpanStatus};

use super::common::{get, get_with_headers, test_app};

const SUPPORTED_CODES: [u16; 7] = [400, 401, 403, 404, 429, 500, 503];

#[tokio::test]
async fn test_status_equals_requested_code() {
    for code in SUPPORTED_CODES {
        let (app, _sink) = test_app();
        let (status, response) = get(app, &format!("/demo/http-errors/{code}")).await;

        assert_eq!(status.as_u16(), code);
        assert_eq!(response["status_code"], code);
        assert!(response["error"].is_string());
        assert!(!response["detail"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_request_tracking_marks_failure() {
    for code in SUPPORTED_CODES {
        let (app, sink) = test_app();
        get(app, &format!("/demo/http-errors/{code}")).await;

        let request = sink.span_named("GET /demo/http-errors/{code}").unwrap();
        assert_eq!(request.status, SpanStatus::Error);
        assert_eq!(
            request.attributes.get("success"),
            Some(&AttributeValue::Bool(false))
        );
        assert_eq!(
            request.attributes.get("http.response.status_code"),
            Some(&AttributeValue::Int(i64::from(code)))
        );
    }
}

#[tokio::test]
async fn test_status_specific_headers() {
    let (app, _sink) = test_app();

    let (_, headers, _) = get_with_headers(app.clone(), "/demo/http-errors/401").await;
    assert!(headers.contains_key(header::WWW_AUTHENTICATE));

    let (_, headers, _) = get_with_headers(app.clone(), "/demo/http-errors/429").await;
    assert!(headers.contains_key(header::RETRY_AFTER));

    let (_, headers, _) = get_with_headers(app.clone(), "/demo/http-errors/503").await;
    assert!(headers.contains_key(header::RETRY_AFTER));

    let (_, headers, _) = get_with_headers(app, "/demo/http-errors/404").await;
    assert!(!headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_unsupported_code_falls_back_to_500() {
    for requested in ["418", "200", "teapot"] {
        let (app, sink) = test_app();
        let (status, response) = get(app, &format!("/demo/http-errors/{requested}")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{requested}");
        assert!(response["detail"].as_str().unwrap().contains(requested));

        let logs = sink.logs();
        assert_eq!(logs[0].attributes.get_str("requested_code"), Some(requested));
        assert_eq!(
            logs[0].attributes.get("fallback"),
            Some(&AttributeValue::Bool(true))
        );
    }
}
