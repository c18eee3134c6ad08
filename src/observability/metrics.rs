//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_connections_accepted_total` (counter)
//! - `proxy_active_connections` (gauge)
//! - `proxy_requests_total` (counter): by outcome
//! - `proxy_relayed_bytes_total` (counter): origin bytes written to clients
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_accept() {
    metrics::counter!("proxy_connections_accepted_total").increment(1);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("proxy_active_connections").set(count as f64);
}

/// Count one finished connection by how it ended.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("proxy_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_relayed_bytes(bytes: u64) {
    metrics::counter!("proxy_relayed_bytes_total").increment(bytes);
}
