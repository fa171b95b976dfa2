//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forum_redirects_total` (counter): 301s issued
//! - `forum_redirect_reloads_total` (counter): rule reloads by resulting state
//! - `forum_hash_calls_total` (counter): hashing calls by op and outcome
//! - `forum_hash_duration_seconds` (histogram): hashing latency by op
//! - `forum_hash_workers_spawned_total` (counter): worker processes started
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
/// Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_redirect() {
    counter!("forum_redirects_total").increment(1);
}

pub fn record_redirect_reload(state: &'static str) {
    counter!("forum_redirect_reloads_total", "state" => state).increment(1);
}

/// `error` is the failure kind, `None` on success.
pub fn record_hash_call(op: &'static str, error: Option<&'static str>, start: Instant) {
    let outcome = error.unwrap_or("ok");
    counter!("forum_hash_calls_total", "op" => op, "outcome" => outcome).increment(1);
    histogram!("forum_hash_duration_seconds", "op" => op).record(start.elapsed().as_secs_f64());
}

pub fn record_worker_spawn() {
    counter!("forum_hash_workers_spawned_total").increment(1);
}
