//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default: `0.0.0.0:9090`).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `gateway_cache_lookups_total` - Weather cache lookups (label: result = hit|miss)
//! - `gateway_rate_limited_total` - Requests refused by the rate limiter
//! - `gateway_upstream_requests_total` - Provider calls (labels: kind, outcome)
//!
//! ## Histograms
//! - `gateway_upstream_duration_seconds` - Provider call latency (label: kind)
//!
//! ## Gauges
//! - `gateway_cache_entries` - Entries held by the weather cache
//! - `gateway_rate_limit_clients` - Client keys tracked by the rate limiter
//!
//! Recording functions are no-ops until [`init_metrics`] installs a recorder,
//! so handlers and tests can call them unconditionally.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_LOOKUPS_TOTAL: &str = "gateway_cache_lookups_total";
    pub const RATE_LIMITED_TOTAL: &str = "gateway_rate_limited_total";
    pub const UPSTREAM_REQUESTS_TOTAL: &str = "gateway_upstream_requests_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "gateway_upstream_duration_seconds";
    pub const CACHE_ENTRIES: &str = "gateway_cache_entries";
    pub const RATE_LIMIT_CLIENTS: &str = "gateway_rate_limit_clients";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns a message if the exporter cannot be installed (e.g. the port is
/// taken or a recorder is already set).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "Weather cache lookups by result"
    );
    describe_counter!(
        names::RATE_LIMITED_TOTAL,
        "Requests refused by the per-client rate limiter"
    );
    describe_counter!(
        names::UPSTREAM_REQUESTS_TOTAL,
        "Provider requests by kind and outcome"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Provider request duration in seconds"
    );
    describe_gauge!(
        names::CACHE_ENTRIES,
        "Entries currently held by the weather cache"
    );
    describe_gauge!(
        names::RATE_LIMIT_CLIENTS,
        "Client keys currently tracked by the rate limiter"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a weather cache lookup.
pub fn record_cache_lookup(hit: bool) {
    counter!(names::CACHE_LOOKUPS_TOTAL, "result" => if hit { "hit" } else { "miss" })
        .increment(1);
}

/// Record a request refused by the rate limiter.
pub fn record_rate_limited() {
    counter!(names::RATE_LIMITED_TOTAL).increment(1);
}

/// Record one provider call and its latency.
///
/// `outcome` is the HTTP status code, `timeout`, or `transport_error`.
pub fn record_upstream_request(kind: &'static str, outcome: &str, duration_secs: f64) {
    counter!(names::UPSTREAM_REQUESTS_TOTAL, "kind" => kind, "outcome" => outcome.to_string())
        .increment(1);
    histogram!(names::UPSTREAM_DURATION_SECONDS, "kind" => kind).record(duration_secs);
}

/// Update the shared-structure size gauges.
pub fn set_state_sizes(cache_entries: usize, tracked_clients: usize) {
    gauge!(names::CACHE_ENTRIES).set(cache_entries as f64);
    gauge!(names::RATE_LIMIT_CLIENTS).set(tracked_clients as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only verify the functions don't panic without a recorder.

    #[test]
    fn test_record_cache_lookup() {
        record_cache_lookup(true);
        record_cache_lookup(false);
    }

    #[test]
    fn test_record_upstream_request() {
        record_upstream_request("weather", "200", 0.12);
        record_upstream_request("tile", "timeout", 5.0);
    }

    #[test]
    fn test_set_state_sizes() {
        record_rate_limited();
        set_state_sizes(3, 7);
    }
}
