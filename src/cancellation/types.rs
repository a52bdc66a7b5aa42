//! Cancellation domain types.

use serde::Serialize;
use std::fmt;

/// Opaque identifier of the reservation to cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReservationToken(String);

impl ReservationToken {
    /// Accepts any non-empty string; the format is the platform's business.
    pub fn parse(value: &str) -> Option<Self> {
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque credential authorizing the cancellation.
///
/// Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn parse(value: &str) -> Option<Self> {
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    /// The raw credential, for transports only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Classified outcome of a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationStatus {
    Succeeded,
    AlreadyCancelled,
    NotFound,
    Rejected,
    /// Only ever seen between attempts; callers receive `Rejected` instead.
    TransientFailure,
}

impl CancellationStatus {
    /// Statuses after which no further attempt is made.
    pub fn is_terminal(self) -> bool {
        self != CancellationStatus::TransientFailure
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CancellationStatus::Succeeded => "succeeded",
            CancellationStatus::AlreadyCancelled => "already_cancelled",
            CancellationStatus::NotFound => "not_found",
            CancellationStatus::Rejected => "rejected",
            CancellationStatus::TransientFailure => "transient_failure",
        }
    }
}

impl fmt::Display for CancellationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a result is `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Empty reservation or auth token; no external call was made.
    InvalidInput,
    /// The platform refused the cancellation for good.
    Permanent,
    /// Every attempt ended in a transient failure.
    RetriesExhausted,
    /// The caller's deadline passed before a terminal answer.
    DeadlineExceeded,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::InvalidInput => "invalid_input",
            RejectReason::Permanent => "permanent",
            RejectReason::RetriesExhausted => "retries_exhausted",
            RejectReason::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Outcome of a `cancel` call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationResult {
    status: CancellationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<RejectReason>,
    attempts: u32,
}

impl CancellationResult {
    /// A terminal result produced by classification.
    pub(crate) fn terminal(status: CancellationStatus, message: Option<String>, attempts: u32) -> Self {
        let reason = (status == CancellationStatus::Rejected).then_some(RejectReason::Permanent);
        Self {
            status,
            message,
            reason,
            attempts,
        }
    }

    pub(crate) fn rejected(reason: RejectReason, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: CancellationStatus::Rejected,
            message: Some(message.into()),
            reason: Some(reason),
            attempts,
        }
    }

    pub fn status(&self) -> CancellationStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Set only when the status is `Rejected`.
    pub fn reason(&self) -> Option<RejectReason> {
        self.reason
    }

    /// External calls made, the cut-off one included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// `Succeeded` or `AlreadyCancelled`: the reservation is no longer active.
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            CancellationStatus::Succeeded | CancellationStatus::AlreadyCancelled
        )
    }
}
