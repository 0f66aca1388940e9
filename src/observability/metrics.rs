//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_registration_attempts_total` (counter): attempts by service, outcome
//! - `registry_registration_exhausted_total` (counter): services that used every attempt
//! - `service_runner_failures_total` (counter): fatal runner errors by runner
//! - `service_runner_up` (gauge): 1 while a runner is serving, 0 otherwise
//! - `http_requests_in_flight` (gauge): requests admitted and not yet answered
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_registration_attempt(service: &str, outcome: &'static str) {
    metrics::counter!(
        "registry_registration_attempts_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_registration_exhausted(service: &str) {
    metrics::counter!(
        "registry_registration_exhausted_total",
        "service" => service.to_string()
    )
    .increment(1);
}

pub fn record_runner_failure(runner: &str) {
    metrics::counter!("service_runner_failures_total", "runner" => runner.to_string())
        .increment(1);
}

pub fn record_runner_up(runner: &str, up: bool) {
    metrics::gauge!("service_runner_up", "runner" => runner.to_string())
        .set(if up { 1.0 } else { 0.0 });
}

pub fn record_in_flight(count: u64) {
    metrics::gauge!("http_requests_in_flight").set(count as f64);
}
