//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Cancellation attempt:
//!     → timeouts.rs (enforce attempt timeout and caller deadline)
//!     → classification (cancellation/classify.rs)
//!     → On transient failure: retries.rs (policy check, delay from backoff.rs)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Only transient failures are retried
//! - Backoff is capped, so a retry never waits longer than `max_delay`

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{is_retryable, RetryPolicy};
pub use timeouts::{run_bounded, Bounded};
