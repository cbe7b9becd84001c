//! Metrics collection and exposition.
//!
//! # Metrics
//! - `blob_requests_total` (counter): requests by method, partition, status
//! - `blob_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording is observability, not correctness: failures to install
//!   the exporter are logged and serving continues
//! - Labels are low-cardinality by construction (partition names are a
//!   small fixed set after startup)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(error) => tracing::error!(%error, "failed to install metrics exporter"),
    }
}

/// Record one completed blob request.
pub fn record_request(method: &str, status: u16, partition: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("partition", partition.to_string()),
        ("status", status.to_string()),
    ];
    counter!("blob_requests_total", &labels).increment(1);
    histogram!("blob_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}
