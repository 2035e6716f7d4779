//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by handler, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by handler
//! - `gateway_auth_decisions_total` (counter): strategy outcomes
//! - `gateway_upstream_errors_total` (counter): transport failures by handler
//!
//! Recording is a no-op until `init_metrics` installs the exporter, so tests
//! and embedders pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(handler: &'static str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "handler" => handler,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "handler" => handler)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one authorization strategy.
pub fn record_auth_decision(strategy: &'static str, outcome: &'static str) {
    metrics::counter!(
        "gateway_auth_decisions_total",
        "strategy" => strategy,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a transport failure talking to an upstream.
pub fn record_upstream_error(handler: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "handler" => handler).increment(1);
}
