//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! CancellationClient produces:
//!     → tracing.rs (one span per call, correlated by call_id)
//!     → log events (attempt outcomes, retries, final result)
//!     → metrics.rs (attempt/result counters, call latency)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;
