//! Retry policy.
//!
//! # Responsibilities
//! - Decide whether a classified outcome may be retried
//! - Hold the validated backoff parameters for a client
//! - Produce the delay before each retry
//!
//! # Design Decisions
//! - Only `TransientFailure` is retryable; every other status is terminal
//! - Parameters are validated once, at construction, never per call

use std::time::Duration;

use crate::cancellation::types::CancellationStatus;
use crate::config::schema::{RetryConfig, TimeoutConfig};
use crate::config::validation::{policy_violations, ValidationError};
use crate::resilience::backoff::{calculate_backoff, nominal_delay};

/// Whether a classified attempt outcome should be retried.
pub fn is_retryable(status: CancellationStatus) -> bool {
    status == CancellationStatus::TransientFailure
}

/// Validated retry and timeout parameters used by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    jitter_ratio: f64,
    attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Build a policy, rejecting parameters that would make backoff meaningless.
    pub fn new(retries: &RetryConfig, timeouts: &TimeoutConfig) -> Result<Self, Vec<ValidationError>> {
        let errors = policy_violations(retries, timeouts);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            max_attempts: retries.max_attempts,
            base_delay: retries.base_delay(),
            max_delay: retries.max_delay(),
            backoff_multiplier: retries.backoff_multiplier,
            jitter_ratio: retries.jitter_ratio,
            attempt_timeout: timeouts.attempt_timeout(),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Delay to wait after failed attempt number `attempt`, jitter included.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.base_delay,
            self.max_delay,
            self.backoff_multiplier,
            self.jitter_ratio,
        )
    }

    /// The jitter-free delays between consecutive attempts.
    ///
    /// Has `max_attempts - 1` entries.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|attempt| {
                nominal_delay(attempt, self.base_delay, self.max_delay, self.backoff_multiplier)
            })
            .collect()
    }
}
