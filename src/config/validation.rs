//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, multiplier >= 1, delays ordered)
//! - Report every violation at once rather than the first one

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{ClientConfig, RetryConfig, TimeoutConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic rule broken by a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("retries.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("retries.base_delay_ms ({base_ms}) exceeds retries.max_delay_ms ({max_ms})")]
    BaseDelayAboveMax { base_ms: u64, max_ms: u64 },

    #[error("retries.backoff_multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    #[error("retries.jitter_ratio must be within [0.0, 1.0), got {0}")]
    InvalidJitter(f64),

    #[error("timeouts.attempt_timeout_ms must be greater than 0")]
    ZeroAttemptTimeout,

    #[error("timeouts.call_deadline_ms must be greater than 0 when set")]
    ZeroCallDeadline,

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Rules a retry policy must satisfy before a client can be built.
pub fn policy_violations(retries: &RetryConfig, timeouts: &TimeoutConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::BaseDelayAboveMax {
            base_ms: retries.base_delay_ms,
            max_ms: retries.max_delay_ms,
        });
    }
    if !retries.backoff_multiplier.is_finite() || retries.backoff_multiplier < 1.0 {
        errors.push(ValidationError::InvalidMultiplier(retries.backoff_multiplier));
    }
    if !(0.0..1.0).contains(&retries.jitter_ratio) {
        errors.push(ValidationError::InvalidJitter(retries.jitter_ratio));
    }
    if timeouts.attempt_timeout_ms == 0 {
        errors.push(ValidationError::ZeroAttemptTimeout);
    }

    errors
}

/// Check a parsed configuration, returning every violation found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = policy_violations(&config.retries, &config.timeouts);

    if config.timeouts.call_deadline_ms == Some(0) {
        errors.push(ValidationError::ZeroCallDeadline);
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
