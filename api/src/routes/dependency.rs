//! External dependency demo.
//!
//! Performs one real outbound HTTP call inside a `Client` span. A failed
//! call is recorded on the span and reported in the response body; it never
//! turns into an error status for the caller.

use crate::middleware::RequestSpan;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use reqwest::StatusCode;
use serde::Serialize;
use shared::models::{AttributeValue, Attributes, LogLevel, SpanKind};
use shared::telemetry::SpanContext;
use std::time::Instant;
use thiserror::Error;

/// Path fetched by the dependency demo.
pub const POST_PATH: &str = "/posts/1";

/// Prefix of span attributes copied from the upstream JSON object.
const RESPONSE_ATTRIBUTE_PREFIX: &str = "dependency.response.";

/// Failure of an outbound call.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The request could not be completed (connect error, timeout, bad body).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {0}")]
    Status(StatusCode),
}

/// Result of one outbound call.
#[derive(Debug, Serialize)]
pub struct DependencyOutcome {
    /// Host that was called.
    pub target: String,
    /// Full URL that was called.
    pub url: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Upstream status, if a response arrived.
    pub status_code: Option<u16>,
    /// Wall time of the call.
    pub duration_ms: f64,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Upstream JSON payload.
    #[serde(skip)]
    pub data: Option<serde_json::Value>,
}

/// Dependency demo response.
#[derive(Debug, Serialize)]
pub struct DependencyResponse {
    /// Human-readable summary.
    pub message: &'static str,
    /// Host that was called.
    pub external_api: String,
    /// The recorded dependency.
    pub dependency: DependencyOutcome,
    /// Upstream payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Creates the dependency demo routes.
pub fn dependency_routes(state: AppState) -> Router {
    Router::new()
        .route("/demo/dependency", get(demo_dependency))
        .with_state(state)
}

/// Calls `path` on the configured dependency inside a `Client` span.
pub(crate) async fn call_dependency(
    state: &AppState,
    parent: &SpanContext,
    path: &str,
) -> DependencyOutcome {
    let url = format!("{}{path}", state.demo().dependency_url);
    let target = reqwest::Url::parse(&url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.clone());

    let mut span = state.telemetry().start_span_with_kind(
        "external_api_call",
        SpanKind::Client,
        Some(parent),
    );
    span.set_attribute("dependency.type", "http");
    span.set_attribute("dependency.target", target.as_str());
    span.set_attribute("http.request.method", "GET");
    span.set_attribute("url.full", url.as_str());

    let started = Instant::now();
    let result = fetch(state.http_client(), &url).await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    span.set_attribute("duration_ms", duration_ms);

    match result {
        Ok((status, data)) => {
            span.set_attribute("http.response.status_code", status.as_u16());
            span.set_attribute("dependency.success", true);
            for (key, value) in response_attributes(&data).iter() {
                span.set_attribute(key.clone(), value.clone());
            }
            span.set_ok();
            span.emit_log(
                LogLevel::Info,
                "External API called successfully",
                Attributes::new()
                    .with("status_code", status.as_u16())
                    .with("response_time_ms", duration_ms),
            );
            DependencyOutcome {
                target,
                url,
                success: true,
                status_code: Some(status.as_u16()),
                duration_ms,
                error: None,
                data: Some(data),
            }
        }
        Err(e) => {
            let status_code = match &e {
                DependencyError::Status(status) => Some(status.as_u16()),
                DependencyError::Request(inner) => inner.status().map(|s| s.as_u16()),
            };
            if let Some(code) = status_code {
                span.set_attribute("http.response.status_code", code);
            }
            span.set_attribute("dependency.success", false);
            span.record_exception("DependencyError", &e);
            span.set_error(e.to_string());
            span.emit_log(
                LogLevel::Error,
                format!("External API call failed: {e}"),
                Attributes::new()
                    .with("dependency.target", target.as_str())
                    .with("response_time_ms", duration_ms),
            );
            DependencyOutcome {
                target,
                url,
                success: false,
                status_code,
                duration_ms,
                error: Some(e.to_string()),
                data: None,
            }
        }
    }
}

/// Flattens the top-level fields of an upstream JSON object into span
/// attributes. Nested values are stringified.
fn response_attributes(data: &serde_json::Value) -> Attributes {
    let mut attributes = Attributes::new();
    if let Some(object) = data.as_object() {
        for (key, value) in object {
            attributes.insert(
                format!("{RESPONSE_ATTRIBUTE_PREFIX}{key}"),
                AttributeValue::from_json(value),
            );
        }
    }
    attributes
}

async fn fetch(
    client: &reqwest::Client,
    url: &str,
) -> Result<(StatusCode, serde_json::Value), DependencyError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DependencyError::Status(status));
    }
    let data = response.json::<serde_json::Value>().await?;
    Ok((status, data))
}

async fn demo_dependency(
    State(state): State<AppState>,
    Extension(RequestSpan(request)): Extension<RequestSpan>,
) -> Json<DependencyResponse> {
    let mut outcome = call_dependency(&state, &request, POST_PATH).await;
    let message = if outcome.success {
        "Dependency tracking demonstrated"
    } else {
        "Dependency call failed; failure recorded"
    };

    Json(DependencyResponse {
        message,
        external_api: outcome.target.clone(),
        data: outcome.data.take(),
        dependency: outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoSettings;
    use shared::models::SpanStatus;
    use std::time::Duration;

    fn unreachable_settings() -> DemoSettings {
        DemoSettings {
            dependency_url: "http://127.0.0.1:9".to_string(),
            dependency_timeout: Duration::from_secs(1),
            ..DemoSettings::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_dependency_is_recorded_not_raised() {
        let (state, sink) = AppState::with_in_memory_telemetry(unreachable_settings()).unwrap();
        let parent = state.telemetry().start_span("parent");

        let outcome = call_dependency(&state, &parent.context(), POST_PATH).await;
        let parent_ctx = parent.context();
        parent.end();

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.target, "127.0.0.1");
        assert_eq!(outcome.url, "http://127.0.0.1:9/posts/1");

        let span = sink.span_named("external_api_call").unwrap();
        assert_eq!(span.kind, SpanKind::Client);
        assert_eq!(span.status, SpanStatus::Error);
        assert_eq!(span.parent_span_id.as_deref(), Some(parent_ctx.span_id.as_str()));
        assert!(span.has_event("exception"));
        assert_eq!(sink.logs()[0].level, LogLevel::Error);
    }

    #[test]
    fn test_response_attributes_flatten_top_level_fields() {
        let attributes = response_attributes(&serde_json::json!({
            "id": 1,
            "title": "sunt aut facere",
            "tags": ["a", "b"],
        }));

        assert_eq!(attributes.len(), 3);
        assert_eq!(
            attributes.get("dependency.response.id"),
            Some(&AttributeValue::Int(1))
        );
        assert_eq!(
            attributes.get_str("dependency.response.title"),
            Some("sunt aut facere")
        );
        assert_eq!(
            attributes.get_str("dependency.response.tags"),
            Some("[\"a\",\"b\"]")
        );
        assert!(response_attributes(&serde_json::json!([1, 2])).is_empty());
    }

    #[tokio::test]
    async fn test_successful_dependency_records_upstream_fields() {
        let upstream = Router::new().route(
            POST_PATH,
            get(|| async { Json(serde_json::json!({"id": 1, "userId": 7})) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, upstream).await });

        let settings = DemoSettings {
            dependency_url: format!("http://{addr}"),
            ..unreachable_settings()
        };
        let (state, sink) = AppState::with_in_memory_telemetry(settings).unwrap();
        let parent = state.telemetry().start_span("parent");

        let outcome = call_dependency(&state, &parent.context(), POST_PATH).await;
        parent.end();

        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(200));
        assert_eq!(outcome.data, Some(serde_json::json!({"id": 1, "userId": 7})));

        let span = sink.span_named("external_api_call").unwrap();
        assert_eq!(span.status, SpanStatus::Ok);
        assert_eq!(
            span.attributes.get("dependency.response.userId"),
            Some(&AttributeValue::Int(7))
        );
        assert_eq!(sink.logs()[0].level, LogLevel::Info);
    }
}
