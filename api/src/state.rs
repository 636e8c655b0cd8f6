//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::config::DemoSettings;
use anyhow::Result;
use shared::telemetry::{InMemorySink, TelemetryBridge};
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Everything in here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    /// The telemetry bridge.
    telemetry: TelemetryBridge,
    /// Client for outbound dependency calls.
    http_client: reqwest::Client,
    /// Demo endpoint tunables.
    demo: Arc<DemoSettings>,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(telemetry: TelemetryBridge, demo: DemoSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("otel-demo/", env!("CARGO_PKG_VERSION")))
            .timeout(demo.dependency_timeout)
            .build()?;

        Ok(Self {
            telemetry,
            http_client,
            demo: Arc::new(demo),
        })
    }

    /// Creates a state whose telemetry lands in an in-memory sink.
    ///
    /// This is useful for development and testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_in_memory_telemetry(demo: DemoSettings) -> Result<(Self, Arc<InMemorySink>)> {
        let sink = Arc::new(InMemorySink::new());
        let telemetry = TelemetryBridge::with_sink("otel-demo", sink.clone());
        Ok((Self::new(telemetry, demo)?, sink))
    }

    /// Returns the telemetry bridge.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryBridge {
        &self.telemetry
    }

    /// Returns the outbound HTTP client.
    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Returns the demo settings.
    #[must_use]
    pub fn demo(&self) -> &DemoSettings {
        &self.demo
    }
}
