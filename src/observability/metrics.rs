//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by method, status, outcome
//! - `relay_upstream_duration_seconds` (histogram): time spent in the
//!   upstream call, by outcome (`ok` or the failure kind)
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus
//! recorder, so tests and metrics-disabled deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one finished relay request.
pub fn record_request(method: &str, status: u16, outcome: &'static str) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Time one upstream call, from send until the body is decoded or fails.
pub fn record_upstream(outcome: &'static str, start: Instant) {
    histogram!("relay_upstream_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
