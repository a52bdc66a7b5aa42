//! Fixed mapping from raw platform outcomes to cancellation statuses.
//!
//! ```text
//! 2xx                       → Succeeded
//! 404                       → NotFound
//! 409, 410                  → AlreadyCancelled
//! 408, 425, 429, 5xx        → TransientFailure
//! any other code            → Rejected
//! Timeout / Connection      → TransientFailure
//! Malformed                 → Rejected
//! ```

use crate::cancellation::transport::{PlatformResponse, TransportError};
use crate::cancellation::types::CancellationStatus;

/// A classified attempt outcome with its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: CancellationStatus,
    pub message: Option<String>,
}

impl Classification {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            status: CancellationStatus::TransientFailure,
            message: Some(message.into()),
        }
    }
}

/// Classify the status code of a platform answer.
pub fn classify_status(status_code: u16) -> CancellationStatus {
    match status_code {
        200..=299 => CancellationStatus::Succeeded,
        404 => CancellationStatus::NotFound,
        409 | 410 => CancellationStatus::AlreadyCancelled,
        408 | 425 | 429 | 500..=599 => CancellationStatus::TransientFailure,
        _ => CancellationStatus::Rejected,
    }
}

/// Classify whatever a transport returned for one attempt.
pub fn classify(outcome: Result<PlatformResponse, TransportError>) -> Classification {
    match outcome {
        Ok(response) => {
            let status = classify_status(response.status_code);
            let code = response.status_code;
            let message = response.message.or_else(|| {
                (status != CancellationStatus::Succeeded)
                    .then(|| format!("platform returned status {}", code))
            });
            Classification { status, message }
        }
        Err(err @ (TransportError::Timeout | TransportError::Connection(_))) => {
            Classification::transient(err.to_string())
        }
        Err(err @ TransportError::Malformed(_)) => Classification {
            status: CancellationStatus::Rejected,
            message: Some(err.to_string()),
        },
    }
}
