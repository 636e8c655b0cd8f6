//! OTel Demo CLI
//!
//! Command-line driver for a running demo server.
//!
//! # Usage
//!
//! ```bash
//! otel-demo --help
//! otel-demo health
//! otel-demo http-errors
//! otel-demo load --iterations 50 --delay-ms 100
//! ```

#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::seq::IndexedRandom;
use std::time::Duration;

/// Timeout for every request the CLI makes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints exercised by the load generator, successes and failures mixed.
const LOAD_ENDPOINTS: [&str; 11] = [
    "/demo/info",
    "/demo/warning",
    "/demo/error",
    "/demo/metrics",
    "/demo/trace",
    "/demo/dependency",
    "/demo/all",
    "/demo/http-errors/400",
    "/demo/http-errors/404",
    "/demo/http-errors/500",
    "/demo/http-errors/503",
];

/// OTel demo CLI - drive a running demo server
#[derive(Parser)]
#[command(name = "otel-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API server URL
    #[arg(
        short,
        long,
        env = "OTEL_DEMO_API_URL",
        default_value = "http://localhost:8000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API server health
    Health,
    /// Call every error-status endpoint and compare the statuses
    HttpErrors,
    /// Send a random mix of demo requests
    Load {
        /// Number of requests to send
        #[arg(short, long, default_value_t = 20)]
        iterations: u32,
        /// Pause between requests, in milliseconds
        #[arg(short, long, default_value_t = 200)]
        delay_ms: u64,
    },
}

/// One expected-status check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusCase {
    path: String,
    expected: u16,
    description: String,
}

/// Outcome of one expected-status check.
#[derive(Debug)]
struct CheckResult {
    case: StatusCase,
    actual: Option<u16>,
    error: Option<String>,
}

impl CheckResult {
    fn passed(&self) -> bool {
        self.actual == Some(self.case.expected)
    }
}

/// Success and error totals of a load run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LoadStats {
    success: u32,
    errors: u32,
}

impl LoadStats {
    /// Counts a response status; `None` is a transport failure.
    fn record(&mut self, status: Option<u16>) {
        match status {
            Some(code) if code < 400 => self.success += 1,
            _ => self.errors += 1,
        }
    }

    fn total(self) -> u32 {
        self.success + self.errors
    }

    /// Percentage of requests that failed.
    fn error_rate(self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            f64::from(self.errors) * 100.0 / f64::from(self.total())
        }
    }
}

/// The checks run by `http-errors`.
fn status_cases() -> Vec<StatusCase> {
    let mut cases = vec![
        StatusCase {
            path: "/".to_string(),
            expected: 200,
            description: "Root endpoint (200 OK)".to_string(),
        },
        StatusCase {
            path: "/health".to_string(),
            expected: 200,
            description: "Health check (200 OK)".to_string(),
        },
    ];
    cases.extend(
        [
            (400, "Bad Request"),
            (401, "Unauthorized"),
            (403, "Forbidden"),
            (404, "Not Found"),
            (429, "Too Many Requests"),
            (500, "Internal Server Error"),
            (503, "Service Unavailable"),
        ]
        .into_iter()
        .map(|(code, name)| StatusCase {
            path: format!("/demo/http-errors/{code}"),
            expected: code,
            description: format!("{name} ({code})"),
        }),
    );
    cases
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

async fn fetch_status(client: &reqwest::Client, url: &str) -> Result<u16> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?;
    Ok(response.status().as_u16())
}

async fn health(client: &reqwest::Client, base: &str) -> Result<()> {
    let url = endpoint_url(base, "/health");
    println!("Checking health of OTel demo API at {base}...");

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Server is not reachable at {base}"))?;
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

    if !status.is_success() {
        bail!("Health check failed with status {status}");
    }
    println!(
        "Server is {} (service: {}, version: {})",
        body["status"].as_str().unwrap_or("unknown"),
        body["service"].as_str().unwrap_or("unknown"),
        body["version"].as_str().unwrap_or("unknown"),
    );
    Ok(())
}

async fn http_errors(client: &reqwest::Client, base: &str) -> Result<()> {
    health(client, base).await?;
    println!("\nTesting HTTP status codes...\n");

    let mut results = Vec::new();
    for case in status_cases() {
        let url = endpoint_url(base, &case.path);
        let result = match fetch_status(client, &url).await {
            Ok(actual) => CheckResult {
                case,
                actual: Some(actual),
                error: None,
            },
            Err(e) => CheckResult {
                case,
                actual: None,
                error: Some(format!("{e:#}")),
            },
        };

        let mark = if result.passed() { "✓" } else { "✗" };
        println!("{mark} {}", result.case.description);
        match (&result.actual, &result.error) {
            (Some(actual), _) => {
                println!("   Status: {actual} | Expected: {}", result.case.expected);
            }
            (None, Some(error)) => println!("   Error: {error}"),
            (None, None) => {}
        }
        results.push(result);
    }

    let passed = results.iter().filter(|r| r.passed()).count();
    let failed = results.len() - passed;
    println!("\nTotal Tests: {}", results.len());
    println!("Passed: {passed}");
    println!("Failed: {failed}");

    if failed > 0 {
        bail!("{failed} status check(s) did not match");
    }
    Ok(())
}

async fn load(client: &reqwest::Client, base: &str, iterations: u32, delay: Duration) -> Result<()> {
    health(client, base).await?;
    println!("\nStarting load test ({iterations} requests)...\n");

    let mut stats = LoadStats::default();
    for i in 1..=iterations {
        let path = LOAD_ENDPOINTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("/health");
        let url = endpoint_url(base, path);

        match fetch_status(client, &url).await {
            Ok(status) => {
                stats.record(Some(status));
                let mark = if status < 400 { "✅" } else { "❌" };
                println!("{mark} Request {i}/{iterations}: {path} → {status}");
            }
            Err(e) => {
                stats.record(None);
                tracing::debug!(error = ?e, "Load request failed");
                println!("❌ Request {i}/{iterations}: {path} → Error: {e:#}");
            }
        }

        tokio::time::sleep(delay).await;
    }

    println!("\nLoad Test Results:");
    println!("   Total: {} requests", stats.total());
    println!("   Successful: {}", stats.success);
    println!("   Errors: {}", stats.errors);
    println!("   Error Rate: {:.1}%", stats.error_rate());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    match cli.command {
        Some(Commands::Health) => health(&client, &cli.api_url).await?,
        Some(Commands::HttpErrors) => http_errors(&client, &cli.api_url).await?,
        Some(Commands::Load {
            iterations,
            delay_ms,
        }) => {
            load(
                &client,
                &cli.api_url,
                iterations,
                Duration::from_millis(delay_ms),
            )
            .await?;
        }
        None => {
            println!("OTel demo CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
