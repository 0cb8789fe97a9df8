//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status
//! - `edge_request_duration_seconds` (histogram): time spent in the pipeline
//! - `edge_failures_total` (counter): normalized failures by kind, status
//! - `edge_sanitized_fields_total` (counter): rewritten keys by location
//! - `edge_origin_rejections_total` (counter)
//! - `edge_unmatched_routes_total` (counter)
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_failure(kind: &'static str, status: u16) {
    metrics::counter!(
        "edge_failures_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_sanitized(location: &'static str) {
    metrics::counter!("edge_sanitized_fields_total", "location" => location).increment(1);
}

pub fn record_origin_rejected() {
    metrics::counter!("edge_origin_rejections_total").increment(1);
}

pub fn record_unmatched_route() {
    metrics::counter!("edge_unmatched_routes_total").increment(1);
}
