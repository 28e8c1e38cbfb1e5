//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_throttled_total` (counter): requests shed by admission control
//! - `gateway_decisions_total` (counter): authorizer verdicts by outcome
//! - `gateway_audit_writes_total` (counter): audit writes by outcome
//! - `gateway_audit_write_duration_seconds` (histogram)
//! - `gateway_admission_tokens` (gauge): tokens left after the last admit
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_throttled() {
    counter!("gateway_throttled_total").increment(1);
}

pub fn record_decision(allowed: bool) {
    let outcome = if allowed { "allow" } else { "deny" };
    counter!("gateway_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_audit_write(outcome: &'static str, start: Instant) {
    counter!("gateway_audit_writes_total", "outcome" => outcome).increment(1);
    histogram!("gateway_audit_write_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_admission_tokens(tokens: f64) {
    gauge!("gateway_admission_tokens").set(tokens);
}
