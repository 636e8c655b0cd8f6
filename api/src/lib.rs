//! OTel Demo API Server
//!
//! This crate provides the HTTP server of the telemetry demo service. Each
//! `/demo/*` endpoint exercises one kind of telemetry (logs, exceptions,
//! metrics, nested spans, outbound dependencies, latency, error statuses)
//! through the [`shared::telemetry::TelemetryBridge`].
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - Demo endpoints, one route module per telemetry kind
//! - Request tracking middleware recording every request as a server span
//! - Fail-soft telemetry: a missing backend never stops the service
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod middleware;
mod routes;
mod state;

pub use config::{Config, DemoSettings, DEFAULT_DEPENDENCY_URL};
pub use error::{DemoError, ErrorBody, FailureKind, SimulatedFailure};
pub use middleware::RequestSpan;
pub use routes::{ACTIVE_USERS, ERRORS_TOTAL, PROCESSING_DURATION, REQUESTS_TOTAL};
pub use state::AppState;

use anyhow::Result;
use axum::Router;
use shared::telemetry::TelemetryBridge;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Runs the OTel demo API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the OTel demo API server with the provided configuration.
///
/// Telemetry is initialized once per process. Exporters are built and shut
/// down on the blocking pool because they own blocking HTTP clients.
///
/// # Errors
///
/// Returns an error if:
/// - The configured address is invalid or cannot be bound
/// - The outbound HTTP client cannot be built
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let addr = config.socket_addr()?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        service = %config.service_name,
        environment = %config.environment,
        "OTel demo API server starting"
    );

    let telemetry_config = config.telemetry_config();
    let telemetry = tokio::task::spawn_blocking(move || {
        TelemetryBridge::init_global(telemetry_config).clone()
    })
    .await?;

    let state = AppState::new(telemetry.clone(), config.demo)?;
    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        telemetry_enabled = telemetry.is_enabled(),
        "Listening for connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing telemetry");
    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::logs_routes(state.clone()))
        .merge(routes::exceptions_routes(state.clone()))
        .merge(routes::metrics_routes(state.clone()))
        .merge(routes::traces_routes(state.clone()))
        .merge(routes::dependency_routes(state.clone()))
        .merge(routes::slow_routes(state.clone()))
        .merge(routes::http_errors_routes(state.clone()))
        .merge(routes::all_routes(state.clone()));
    with_middleware(routes, state)
}

/// Wraps routes in panic recovery, request tracking and access logging.
///
/// Panic recovery sits innermost so a panicking handler is still tracked
/// as a failed request.
fn with_middleware(routes: Router, state: AppState) -> Router {
    routes
        .layer(CatchPanicLayer::custom(middleware::PanicResponder::new(
            state.telemetry().clone(),
        )))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
///
/// If a handler cannot be installed the corresponding signal is ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
