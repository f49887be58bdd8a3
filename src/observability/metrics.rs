//! Metrics collection and exposition.
//!
//! # Metrics
//! - `node_pulse_rpc_errors_total` (counter): failed RPC calls by method
//! - `node_pulse_head_block` (gauge): last dispatched block number
//! - `node_pulse_blocks_dispatched_total` (counter)
//! - `node_pulse_transactions_reported_total` (counter): by direction
//! - `node_pulse_pending_transactions_total` (counter): by direction
//! - `node_pulse_balance_changes_total` (counter)

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_error(method: &'static str) {
    counter!("node_pulse_rpc_errors_total", "method" => method).increment(1);
}

pub fn record_block_dispatched(number: u64) {
    counter!("node_pulse_blocks_dispatched_total").increment(1);
    gauge!("node_pulse_head_block").set(number as f64);
}

pub fn record_transaction_reported(direction: &'static str) {
    counter!("node_pulse_transactions_reported_total", "direction" => direction).increment(1);
}

pub fn record_pending_transaction(direction: &'static str) {
    counter!("node_pulse_pending_transactions_total", "direction" => direction).increment(1);
}

pub fn record_balance_change() {
    counter!("node_pulse_balance_changes_total").increment(1);
}
