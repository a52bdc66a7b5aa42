//! Boundary to the external reservation platform.
//!
//! A transport turns one cancellation attempt into a raw platform answer.
//! Wire format, endpoints and auth scheme live entirely behind this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::cancellation::types::{AuthToken, ReservationToken};

/// Raw answer from the platform, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformResponse {
    /// HTTP-class status code.
    pub status_code: u16,
    /// Human-readable detail supplied by the platform, if any.
    pub message: Option<String>,
}

impl PlatformResponse {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: Some(message.into()),
        }
    }

    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            message: None,
        }
    }
}

/// Failures that happen before the platform produced an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport gave up waiting for the platform.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The platform answered with something that could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Adapter that performs a single cancellation call against the platform.
#[async_trait]
pub trait CancellationTransport: Send + Sync {
    async fn cancel(
        &self,
        reservation: &ReservationToken,
        auth: &AuthToken,
    ) -> Result<PlatformResponse, TransportError>;
}
