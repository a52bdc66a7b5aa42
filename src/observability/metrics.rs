//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resy_cancel_attempts_total` (counter): external calls by classified status,
//!   or `deadline_exceeded` when the deadline cut the call short
//! - `resy_cancel_retries_total` (counter): backoff sleeps started
//! - `resy_cancel_results_total` (counter): returned results by status, reason
//! - `resy_cancel_call_duration_seconds` (histogram): wall time of a `cancel` call
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus exporter is opt-in (CLI flag or config)

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::time::Instant;

use crate::cancellation::types::{CancellationResult, CancellationStatus};

/// Install the Prometheus exporter serving `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one classified attempt.
pub fn record_attempt(status: CancellationStatus) {
    counter!("resy_cancel_attempts_total", "status" => status.as_str()).increment(1);
}

/// Record an attempt cut short by the caller's deadline.
pub fn record_attempt_cut() {
    counter!("resy_cancel_attempts_total", "status" => "deadline_exceeded").increment(1);
}

/// Record a backoff sleep before the next attempt.
pub fn record_retry() {
    counter!("resy_cancel_retries_total").increment(1);
}

/// Record the result handed back to the caller.
pub fn record_result(result: &CancellationResult, started: Instant) {
    let reason = result.reason().map_or("none", |r| r.as_str());
    counter!(
        "resy_cancel_results_total",
        "status" => result.status().as_str(),
        "reason" => reason
    )
    .increment(1);
    histogram!("resy_cancel_call_duration_seconds").record(started.elapsed().as_secs_f64());
}
