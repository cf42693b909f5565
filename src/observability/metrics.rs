//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): proxied requests by target, method, status
//! - `edge_request_duration_seconds` (histogram): time to response head
//! - `edge_upstream_errors_total` (counter): failed upstream calls by kind
//! - `edge_login_attempts_total` (counter): login outcomes
//! - `edge_rate_limited_total` (counter): rejected by rate limiting
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(target: &'static str, method: &str, status: u16, start: Instant) {
    counter!(
        "edge_requests_total",
        "target" => target,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("edge_request_duration_seconds", "target" => target)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(target: &'static str, kind: &'static str) {
    counter!("edge_upstream_errors_total", "target" => target, "kind" => kind).increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("edge_login_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(scope: &'static str) {
    counter!("edge_rate_limited_total", "scope" => scope).increment(1);
}
