//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ehr_transactions_total` (counter): submitted actions by action, outcome
//! - `ehr_confirmation_seconds` (histogram): submit-to-confirmation latency
//! - `ehr_reads_total` (counter): contract reads by query, outcome
//! - `ehr_view_discarded_total` (counter): stale view updates dropped, by field

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction(action: &'static str, outcome: &'static str) {
    counter!("ehr_transactions_total", "action" => action, "outcome" => outcome).increment(1);
}

pub fn record_confirmation_latency(action: &'static str, seconds: f64) {
    histogram!("ehr_confirmation_seconds", "action" => action).record(seconds);
}

pub fn record_read(query: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("ehr_reads_total", "query" => query, "outcome" => outcome).increment(1);
}

pub fn record_view_discarded(field: &'static str) {
    counter!("ehr_view_discarded_total", "field" => field).increment(1);
}
