//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_cache_updates_total` (counter): generations installed
//! - `route_cache_configurations` (gauge): route configurations in the
//!   current generation
//! - `route_cache_virtual_hosts` (gauge): virtual hosts across them
//! - `route_cache_rebuild_duration_seconds` (histogram): graph to cache time
//! - `route_cache_queries_total` (counter): reads, labelled by `kind`
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a freshly installed cache generation.
pub fn record_cache_update(configurations: usize, virtual_hosts: usize, start: Instant) {
    ::metrics::counter!("route_cache_updates_total").increment(1);
    ::metrics::gauge!("route_cache_configurations").set(configurations as f64);
    ::metrics::gauge!("route_cache_virtual_hosts").set(virtual_hosts as f64);
    ::metrics::histogram!("route_cache_rebuild_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record a cache read.
pub fn record_query(kind: &'static str) {
    ::metrics::counter!("route_cache_queries_total", "kind" => kind).increment(1);
}
