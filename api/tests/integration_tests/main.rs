//! Integration tests for the OTel demo API.
//!
//! These tests drive the full router (request tracking included) and
//! inspect the telemetry it produced through an in-memory sink.

mod common;

mod all_tests;
mod dependency_tests;
mod exceptions_tests;
mod health_tests;
mod http_errors_tests;
mod logs_tests;
mod metrics_tests;
mod traces_tests;
