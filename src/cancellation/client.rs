//! Resilient cancellation client.
//!
//! # Responsibilities
//! - Reject empty tokens before any external call
//! - Bound each attempt by the attempt timeout and the caller's deadline
//! - Classify every attempt and retry transient failures with backoff
//! - Hand back a `CancellationResult`, never an error
//!
//! # Design Decisions
//! - Stateless: the transport is shared behind `Arc`, nothing else is held
//! - No in-flight deduplication; the platform is the source of truth and its
//!   "already cancelled" answer is what makes repeated calls idempotent
//! - A backoff sleep that would cross the deadline is never started

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::Instrument;

use crate::cancellation::classify::{classify, Classification};
use crate::cancellation::transport::CancellationTransport;
use crate::cancellation::types::{AuthToken, CancellationResult, RejectReason, ReservationToken};
use crate::config::{ClientConfig, ConfigError, ValidationError};
use crate::observability::metrics;
use crate::observability::tracing::call_span;
use crate::resilience::timeouts::remaining;
use crate::resilience::{is_retryable, run_bounded, Bounded, RetryPolicy};

/// The capability of cancelling a reservation on the external platform.
#[async_trait]
pub trait ReservationBroker: Send + Sync {
    /// Cancel `reservation_token`, giving up at `deadline` if one is set.
    async fn cancel_reservation(
        &self,
        reservation_token: &str,
        auth_token: &str,
        deadline: Option<Instant>,
    ) -> CancellationResult;
}

/// Cancellation client with bounded retries over a pluggable transport.
#[derive(Clone)]
pub struct CancellationClient {
    transport: Arc<dyn CancellationTransport>,
    policy: RetryPolicy,
    default_deadline: Option<Duration>,
}

impl CancellationClient {
    /// Create a client. Invalid retry or timeout settings fail here and
    /// nowhere else.
    pub fn new(
        transport: Arc<dyn CancellationTransport>,
        config: &ClientConfig,
    ) -> Result<Self, ConfigError> {
        let policy = RetryPolicy::new(&config.retries, &config.timeouts)?;
        if config.timeouts.call_deadline_ms == Some(0) {
            return Err(ConfigError::Validation(vec![ValidationError::ZeroCallDeadline]));
        }

        tracing::debug!(
            max_attempts = policy.max_attempts(),
            attempt_timeout = ?policy.attempt_timeout(),
            "Cancellation client initialized"
        );

        Ok(Self {
            transport,
            policy,
            default_deadline: config.timeouts.call_deadline(),
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Cancel using the configured default deadline, if any.
    pub async fn cancel(&self, reservation_token: &str, auth_token: &str) -> CancellationResult {
        let deadline = self.default_deadline.and_then(deadline_after);
        self.run(reservation_token, auth_token, deadline).await
    }

    /// Cancel, giving up once `budget` has elapsed.
    ///
    /// A budget too large to represent as an instant means no deadline.
    pub async fn cancel_within(
        &self,
        reservation_token: &str,
        auth_token: &str,
        budget: Duration,
    ) -> CancellationResult {
        self.run(reservation_token, auth_token, deadline_after(budget))
            .await
    }

    /// Cancel, giving up at `deadline`.
    pub async fn cancel_before(
        &self,
        reservation_token: &str,
        auth_token: &str,
        deadline: Instant,
    ) -> CancellationResult {
        self.run(reservation_token, auth_token, Some(deadline)).await
    }

    async fn run(
        &self,
        reservation_token: &str,
        auth_token: &str,
        deadline: Option<Instant>,
    ) -> CancellationResult {
        let started = Instant::now();

        let (reservation, auth) = match (
            ReservationToken::parse(reservation_token),
            AuthToken::parse(auth_token),
        ) {
            (Some(reservation), Some(auth)) => (reservation, auth),
            (reservation, _) => {
                let field = if reservation.is_none() { "reservation token" } else { "auth token" };
                tracing::warn!(field, "Rejecting cancellation with empty input");
                let result = CancellationResult::rejected(
                    RejectReason::InvalidInput,
                    format!("{} must not be empty", field),
                    0,
                );
                metrics::record_result(&result, started);
                return result;
            }
        };

        let span = call_span(&reservation);
        let result = self
            .attempt_loop(&reservation, &auth, deadline)
            .instrument(span)
            .await;

        metrics::record_result(&result, started);
        result
    }

    async fn attempt_loop(
        &self,
        reservation: &ReservationToken,
        auth: &AuthToken,
        deadline: Option<Instant>,
    ) -> CancellationResult {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;
        let mut last_failure: Option<String> = None;

        loop {
            if remaining(deadline).is_some_and(|left| left.is_zero()) {
                return deadline_exceeded(attempt, last_failure);
            }
            attempt += 1;

            let call = self.transport.cancel(reservation, auth);
            let classification = match run_bounded(call, self.policy.attempt_timeout(), deadline).await {
                Bounded::Completed(outcome) => classify(outcome),
                Bounded::TimedOut(limit) => Classification::transient(format!(
                    "attempt timed out after {}ms",
                    limit.as_millis()
                )),
                Bounded::DeadlineExceeded => {
                    metrics::record_attempt_cut();
                    return deadline_exceeded(attempt, last_failure);
                }
            };
            metrics::record_attempt(classification.status);

            if !is_retryable(classification.status) {
                tracing::info!(
                    attempt,
                    status = %classification.status,
                    "Cancellation finished"
                );
                return CancellationResult::terminal(
                    classification.status,
                    classification.message,
                    attempt,
                );
            }

            let detail = classification
                .message
                .unwrap_or_else(|| "transient failure".to_string());

            if attempt >= max_attempts {
                tracing::warn!(attempt, error = %detail, "Cancellation retries exhausted");
                return CancellationResult::rejected(
                    RejectReason::RetriesExhausted,
                    format!("retries exhausted after {} attempts: {}", attempt, detail),
                    attempt,
                );
            }

            let delay = self.policy.delay_after(attempt);
            if remaining(deadline).is_some_and(|left| left <= delay) {
                return deadline_exceeded(attempt, Some(detail));
            }

            tracing::info!(attempt, delay = ?delay, error = %detail, "Retrying cancellation");
            metrics::record_retry();
            last_failure = Some(detail);
            sleep(delay).await;
        }
    }
}

/// `budget` from now, or `None` when that instant overflows.
fn deadline_after(budget: Duration) -> Option<Instant> {
    Instant::now().checked_add(budget)
}

fn deadline_exceeded(attempts: u32, last_failure: Option<String>) -> CancellationResult {
    let message = match last_failure {
        Some(detail) => format!("deadline exceeded after {} attempts: {}", attempts, detail),
        None => format!("deadline exceeded after {} attempts", attempts),
    };
    tracing::warn!(attempts, "Cancellation deadline exceeded");
    CancellationResult::rejected(RejectReason::DeadlineExceeded, message, attempts)
}

#[async_trait]
impl ReservationBroker for CancellationClient {
    async fn cancel_reservation(
        &self,
        reservation_token: &str,
        auth_token: &str,
        deadline: Option<Instant>,
    ) -> CancellationResult {
        let deadline = deadline.or_else(|| self.default_deadline.and_then(deadline_after));
        self.run(reservation_token, auth_token, deadline).await
    }
}

impl std::fmt::Debug for CancellationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationClient")
            .field("policy", &self.policy)
            .field("default_deadline", &self.default_deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::memory::{Fault, InMemoryPlatform};
    use crate::cancellation::types::CancellationStatus;

    fn fast_config(max_attempts: u32) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.retries.max_attempts = max_attempts;
        config.retries.base_delay_ms = 10;
        config.retries.max_delay_ms = 100;
        config.retries.jitter_ratio = 0.0;
        config
    }

    fn client_for(platform: &InMemoryPlatform, config: &ClientConfig) -> CancellationClient {
        CancellationClient::new(Arc::new(platform.clone()), config).unwrap()
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let mut config = fast_config(3);
        config.retries.backoff_multiplier = 0.0;
        let err = CancellationClient::new(Arc::new(InMemoryPlatform::new()), &config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let mut config = fast_config(3);
        config.timeouts.call_deadline_ms = Some(0);
        assert!(CancellationClient::new(Arc::new(InMemoryPlatform::new()), &config).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_then_already_cancelled() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        let client = client_for(&platform, &fast_config(3));

        let first = client.cancel("RES-1", "TOK-abc").await;
        assert_eq!(first.status(), CancellationStatus::Succeeded);
        assert_eq!(first.attempts(), 1);

        let second = client.cancel("RES-1", "TOK-abc").await;
        assert_eq!(second.status(), CancellationStatus::AlreadyCancelled);
        assert!(second.is_success());
        assert_eq!(platform.cancellations_applied(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_inputs_make_no_call() {
        let platform = InMemoryPlatform::new();
        let client = client_for(&platform, &fast_config(3));

        for (reservation, auth) in [("", "TOK"), ("RES-1", ""), ("", "")] {
            let result = client.cancel(reservation, auth).await;
            assert_eq!(result.status(), CancellationStatus::Rejected);
            assert_eq!(result.reason(), Some(RejectReason::InvalidInput));
            assert_eq!(result.attempts(), 0);
        }
        assert_eq!(platform.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_rejection_not_retried() {
        let platform = InMemoryPlatform::new().with_auth_token("TOK-good");
        platform.add_reservation("RES-1");
        let client = client_for(&platform, &fast_config(5));

        let result = client.cancel("RES-1", "TOK-bad").await;
        assert_eq!(result.status(), CancellationStatus::Rejected);
        assert_eq!(result.reason(), Some(RejectReason::Permanent));
        assert_eq!(result.message(), Some("unauthorized"));
        assert_eq!(platform.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_attempt_times_out_and_retries() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        platform.inject_fault(Fault::Stall(Duration::from_secs(60)));

        let mut config = fast_config(3);
        config.timeouts.attempt_timeout_ms = 500;
        let client = client_for(&platform, &config);

        let result = client.cancel("RES-1", "TOK").await;
        assert_eq!(result.status(), CancellationStatus::Succeeded);
        assert_eq!(result.attempts(), 2);
        // The stalled call never reached the ledger.
        assert_eq!(platform.cancellations_applied(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_from_config() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        platform.inject_faults(std::iter::repeat(Fault::Timeout).take(10));

        let mut config = fast_config(10);
        config.retries.base_delay_ms = 100;
        config.retries.max_delay_ms = 100;
        config.timeouts.call_deadline_ms = Some(250);
        let client = client_for(&platform, &config);

        let result = client.cancel("RES-1", "TOK").await;
        assert_eq!(result.reason(), Some(RejectReason::DeadlineExceeded));
        assert!(result.message().unwrap().starts_with("deadline exceeded"));
        assert_eq!(result.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_budget_means_no_deadline() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        platform.inject_fault(Fault::Timeout);
        let client = client_for(&platform, &fast_config(3));

        let result = client.cancel_within("RES-1", "TOK", Duration::MAX).await;
        assert_eq!(result.status(), CancellationStatus::Succeeded);
        assert_eq!(result.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broker_trait_object() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        let broker: Arc<dyn ReservationBroker> = Arc::new(client_for(&platform, &fast_config(3)));

        let result = broker.cancel_reservation("RES-1", "TOK", None).await;
        assert_eq!(result.status(), CancellationStatus::Succeeded);
    }
}
