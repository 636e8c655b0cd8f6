//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{bail, Context, Result};
use shared::telemetry::TelemetryConfig;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// Default base URL of the outbound dependency.
pub const DEFAULT_DEPENDENCY_URL: &str = "https://jsonplaceholder.typicode.com";

/// Tunables for the demo endpoints.
#[derive(Debug, Clone)]
pub struct DemoSettings {
    /// Base URL of the external HTTP dependency, without trailing slash.
    pub dependency_url: String,
    /// Upper bound on a single outbound call.
    pub dependency_timeout: Duration,
    /// Bounds of the randomized slow-demo delay, in milliseconds.
    pub slow_delay_ms: RangeInclusive<u64>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            dependency_url: DEFAULT_DEPENDENCY_URL.to_string(),
            dependency_timeout: Duration::from_secs(5),
            slow_delay_ms: 1000..=3000,
        }
    }
}

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `HOST`: The host address to bind to (default: "0.0.0.0")
/// - `PORT`: The port to listen on (default: 8000)
/// - `APP_NAME` / `OTEL_SERVICE_NAME`: service name reported in telemetry
/// - `APP_VERSION`: service version (default: crate version)
/// - `ENVIRONMENT`: deployment environment (default: "development")
/// - `TELEMETRY_CONNECTION_STRING`: backend credential; unset disables export
/// - `DEPENDENCY_URL`: base URL of the outbound dependency
/// - `DEPENDENCY_TIMEOUT_SECS`: outbound call timeout (default: 5)
/// - `SLOW_MIN_MS` / `SLOW_MAX_MS`: slow-demo delay bounds (default: 1000 / 3000)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Service name reported in telemetry.
    pub service_name: String,
    /// Service version reported in telemetry.
    pub service_version: String,
    /// Deployment environment reported in telemetry.
    pub environment: String,
    /// Telemetry backend credential.
    pub connection_string: Option<String>,
    /// Demo endpoint tunables.
    pub demo: DemoSettings,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A numeric variable is set but cannot be parsed
    /// - `SLOW_MIN_MS` is greater than `SLOW_MAX_MS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or(defaults.host);
        let port = parse_var(&var, "PORT")?.unwrap_or(defaults.port);

        let app_name = var("APP_NAME").unwrap_or(defaults.service_name);
        let service_name = var("OTEL_SERVICE_NAME").unwrap_or(app_name);
        let service_version = var("APP_VERSION").unwrap_or(defaults.service_version);
        let environment = var("ENVIRONMENT").unwrap_or(defaults.environment);
        let connection_string = var("TELEMETRY_CONNECTION_STRING");

        let dependency_url = var("DEPENDENCY_URL")
            .map_or(defaults.demo.dependency_url, |url| {
                url.trim_end_matches('/').to_string()
            });
        let dependency_timeout = parse_var::<u64>(&var, "DEPENDENCY_TIMEOUT_SECS")?
            .map_or(defaults.demo.dependency_timeout, Duration::from_secs);
        let slow_min = parse_var(&var, "SLOW_MIN_MS")?.unwrap_or(*defaults.demo.slow_delay_ms.start());
        let slow_max = parse_var(&var, "SLOW_MAX_MS")?.unwrap_or(*defaults.demo.slow_delay_ms.end());
        if slow_min > slow_max {
            bail!("SLOW_MIN_MS ({slow_min}) must not exceed SLOW_MAX_MS ({slow_max})");
        }

        Ok(Self {
            host,
            port,
            service_name,
            service_version,
            environment,
            connection_string,
            demo: DemoSettings {
                dependency_url,
                dependency_timeout,
                slow_delay_ms: slow_min..=slow_max,
            },
        })
    }

    /// Returns the socket address for binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the host and port do not form a valid socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Telemetry settings derived from this configuration.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.service_name.clone(),
            service_version: self.service_version.clone(),
            environment: self.environment.clone(),
            connection_string: self.connection_string.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            service_name: "otel-demo".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            connection_string: None,
            demo: DemoSettings::default(),
        }
    }
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {key}"))
}
