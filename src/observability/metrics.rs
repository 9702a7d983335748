//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_requests_total` (counter): requests by outcome
//!   (`redirect_307`, `redirect_308`, `pass_through`, `excluded`)
//! - `redirect_resolve_duration_seconds` (histogram): rule evaluation time
//! - `redirect_rules_loaded` (gauge): rules in the current snapshot
//! - `redirect_store_fetch_total` (counter): store fetches by result
//! - `redirect_config_reloads_total` (counter): config reloads by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one intercepted request.
pub fn record_request(outcome: &'static str, start: Instant) {
    metrics::counter!("redirect_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("redirect_resolve_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record a store fetch.
pub fn record_store_fetch(store: &'static str, result: &'static str) {
    metrics::counter!("redirect_store_fetch_total", "store" => store, "result" => result)
        .increment(1);
}

/// Record the size of the installed rule snapshot.
pub fn record_rules_loaded(count: usize) {
    metrics::gauge!("redirect_rules_loaded").set(count as f64);
}

/// Record a configuration reload attempt.
pub fn record_config_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("redirect_config_reloads_total", "result" => result).increment(1);
}
