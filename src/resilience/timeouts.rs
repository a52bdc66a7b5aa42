//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each external call with the per-attempt timeout
//! - Cut an in-flight attempt when the caller's deadline arrives first
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - An attempt timeout and a deadline expiry are distinct outcomes

use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout, Instant};

/// How a bounded attempt ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Bounded<T> {
    /// The wrapped future finished in time.
    Completed(T),
    /// The per-attempt timeout elapsed.
    TimedOut(Duration),
    /// The caller's deadline arrived before the attempt finished.
    DeadlineExceeded,
}

/// Time left before `deadline`, or `None` when there is no deadline.
pub fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|d| d.saturating_duration_since(Instant::now()))
}

/// Run `fut` for at most `attempt_timeout`, and never past `deadline`.
pub async fn run_bounded<F>(fut: F, attempt_timeout: Duration, deadline: Option<Instant>) -> Bounded<F::Output>
where
    F: Future,
{
    let (budget, cut_by_deadline) = match remaining(deadline) {
        Some(left) if left.is_zero() => return Bounded::DeadlineExceeded,
        Some(left) if left < attempt_timeout => (left, true),
        _ => (attempt_timeout, false),
    };

    match timeout(budget, fut).await {
        Ok(output) => Bounded::Completed(output),
        Err(_) if cut_by_deadline => Bounded::DeadlineExceeded,
        Err(_) => Bounded::TimedOut(attempt_timeout),
    }
}
