//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_submissions_total` (counter): submission attempts by outcome
//! - `wallet_connections_total` (counter): wallet connection attempts by outcome
//! - `upstream_requests_total` (counter): evaluator/uploader calls by service, outcome
//! - `ledger_rpc_health` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless `init_metrics` runs.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the terminal outcome of one submission attempt.
pub fn record_submission(outcome: &'static str) {
    metrics::counter!("ledger_submissions_total", "outcome" => outcome).increment(1);
}

/// Record the result of a wallet connection attempt.
pub fn record_wallet_connection(outcome: &'static str) {
    metrics::counter!("wallet_connections_total", "outcome" => outcome).increment(1);
}

/// Record a call to the evaluator or storage uploader.
pub fn record_upstream(service: &'static str, outcome: &'static str) {
    metrics::counter!("upstream_requests_total", "service" => service, "outcome" => outcome)
        .increment(1);
}

/// Record RPC reachability.
pub fn record_rpc_health(healthy: bool) {
    metrics::gauge!("ledger_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
