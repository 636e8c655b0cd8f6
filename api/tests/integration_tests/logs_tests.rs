//! Integration tests for the log level and user context demos.

use axum::http::StatusCode;
use shared::models::{AttributeValue, LogLevel};

use super::common::{get, test_app};

#[tokio::test]
async fn test_log_severity_matches_endpoint() {
    for (uri, level, severity) in [
        ("/demo/info", LogLevel::Info, 1),
        ("/demo/warning", LogLevel::Warning, 2),
        ("/demo/error", LogLevel::Error, 3),
    ] {
        let (app, sink) = test_app();
        let (status, _) = get(app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");

        let logs = sink.logs();
        assert_eq!(logs.len(), 1, "{uri}");
        assert_eq!(logs[0].level, level);
        assert_eq!(logs[0].level.severity(), severity);
        assert!(!logs[0].attributes.is_empty());
    }
}

#[tokio::test]
async fn test_error_log_carries_context() {
    let (app, sink) = test_app();
    let (_, response) = get(app, "/demo/error").await;
    assert_eq!(response["error_logged"], true);

    let logs = sink.logs();
    assert_eq!(logs[0].attributes.get_str("error_code"), Some("ERR_001"));
    assert_eq!(
        logs[0].attributes.get("retry_count"),
        Some(&AttributeValue::Int(3))
    );
}

#[tokio::test]
async fn test_user_context_is_passed_through_verbatim() {
    let user_id = "Ünïcode user #42";
    let action = "checkout&pay=now";
    let uri = format!(
        "/demo/user-context?user_id={}&action={}",
        urlencoding::encode(user_id),
        urlencoding::encode(action)
    );

    let (app, sink) = test_app();
    let (status, response) = get(app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["user_id"], user_id);
    assert_eq!(response["action"], action);

    let logs = sink.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].attributes.get_str("user_id"), Some(user_id));
    assert_eq!(logs[0].attributes.get_str("action"), Some(action));
}

#[tokio::test]
async fn test_user_context_defaults() {
    let (app, sink) = test_app();
    get(app, "/demo/user-context?user_id=u-1").await;

    let logs = sink.logs();
    assert_eq!(logs[0].attributes.get_str("user_id"), Some("u-1"));
    assert_eq!(logs[0].attributes.get_str("action"), Some("view"));
}
