//! In-process reservation platform with fault injection.
//!
//! Answers like the real platform (200 / 404 / 409 / 401) and lets callers
//! script transport faults, one consumed per call.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cancellation::transport::{CancellationTransport, PlatformResponse, TransportError};
use crate::cancellation::types::{AuthToken, ReservationToken};

/// Lifecycle of a reservation held by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    Active,
    Cancelled,
}

/// A scripted failure for the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Report a transport timeout without touching the reservation.
    Timeout,
    /// Report a dropped connection without touching the reservation.
    ConnectionReset,
    /// Answer 503 without touching the reservation.
    ServiceUnavailable,
    /// Apply the cancellation, then report a timeout.
    LostResponse,
    /// Sleep before answering normally.
    Stall(Duration),
}

/// Reservation platform living in memory.
#[derive(Clone, Default)]
pub struct InMemoryPlatform {
    reservations: Arc<DashMap<String, ReservationState>>,
    required_auth: Option<String>,
    faults: Arc<Mutex<VecDeque<Fault>>>,
    calls: Arc<AtomicU32>,
    applied: Arc<AtomicU32>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept calls carrying this credential; others get 401.
    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.required_auth = Some(token.to_string());
        self
    }

    /// Register an active reservation.
    pub fn add_reservation(&self, token: &str) {
        self.reservations.insert(token.to_string(), ReservationState::Active);
    }

    /// Register a reservation that was cancelled elsewhere.
    pub fn add_cancelled_reservation(&self, token: &str) {
        self.reservations.insert(token.to_string(), ReservationState::Cancelled);
    }

    /// Queue a fault for a future call.
    pub fn inject_fault(&self, fault: Fault) {
        self.lock_faults().push_back(fault);
    }

    pub fn inject_faults(&self, faults: impl IntoIterator<Item = Fault>) {
        self.lock_faults().extend(faults);
    }

    pub fn state(&self, token: &str) -> Option<ReservationState> {
        self.reservations.get(token).map(|r| *r.value())
    }

    /// Calls received, faulted ones included.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Times a reservation actually moved from active to cancelled.
    pub fn cancellations_applied(&self) -> u32 {
        self.applied.load(Ordering::SeqCst)
    }

    fn lock_faults(&self) -> std::sync::MutexGuard<'_, VecDeque<Fault>> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_fault(&self) -> Option<Fault> {
        self.lock_faults().pop_front()
    }

    fn apply(&self, reservation: &ReservationToken, auth: &AuthToken) -> PlatformResponse {
        if let Some(required) = &self.required_auth {
            if required != auth.expose() {
                return PlatformResponse::new(401, "unauthorized");
            }
        }

        // The shard write lock makes check-and-set atomic per reservation.
        match self.reservations.get_mut(reservation.as_str()) {
            None => PlatformResponse::new(404, "not found"),
            Some(mut entry) => {
                let current = *entry.value();
                match current {
                    ReservationState::Cancelled => {
                        PlatformResponse::new(409, "conflict: already cancelled")
                    }
                    ReservationState::Active => {
                        *entry.value_mut() = ReservationState::Cancelled;
                        self.applied.fetch_add(1, Ordering::SeqCst);
                        PlatformResponse::new(200, "cancelled")
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CancellationTransport for InMemoryPlatform {
    async fn cancel(
        &self,
        reservation: &ReservationToken,
        auth: &AuthToken,
    ) -> Result<PlatformResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_fault() {
            Some(Fault::Timeout) => Err(TransportError::Timeout),
            Some(Fault::ConnectionReset) => {
                Err(TransportError::Connection("connection reset by peer".into()))
            }
            Some(Fault::ServiceUnavailable) => Ok(PlatformResponse::new(503, "service unavailable")),
            Some(Fault::LostResponse) => {
                let _ = self.apply(reservation, auth);
                Err(TransportError::Timeout)
            }
            Some(Fault::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(self.apply(reservation, auth))
            }
            None => Ok(self.apply(reservation, auth)),
        }
    }
}

impl std::fmt::Debug for InMemoryPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPlatform")
            .field("reservations", &self.reservations.len())
            .field("calls", &self.call_count())
            .field("applied", &self.cancellations_applied())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(reservation: &str, auth: &str) -> (ReservationToken, AuthToken) {
        (
            ReservationToken::parse(reservation).unwrap(),
            AuthToken::parse(auth).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_cancel_then_conflict() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        let (res, auth) = tokens("RES-1", "TOK");

        assert_eq!(platform.cancel(&res, &auth).await.unwrap().status_code, 200);
        assert_eq!(platform.cancel(&res, &auth).await.unwrap().status_code, 409);
        assert_eq!(platform.state("RES-1"), Some(ReservationState::Cancelled));
        assert_eq!(platform.cancellations_applied(), 1);
        assert_eq!(platform.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_reservation() {
        let platform = InMemoryPlatform::new();
        let (res, auth) = tokens("RES-404", "TOK");
        assert_eq!(platform.cancel(&res, &auth).await.unwrap().status_code, 404);
    }

    #[tokio::test]
    async fn test_wrong_auth() {
        let platform = InMemoryPlatform::new().with_auth_token("TOK-good");
        platform.add_reservation("RES-1");
        let (res, auth) = tokens("RES-1", "TOK-bad");

        assert_eq!(platform.cancel(&res, &auth).await.unwrap().status_code, 401);
        assert_eq!(platform.state("RES-1"), Some(ReservationState::Active));
    }

    #[tokio::test]
    async fn test_faults_consumed_in_order() {
        let platform = InMemoryPlatform::new();
        platform.add_reservation("RES-1");
        platform.inject_faults([Fault::ServiceUnavailable, Fault::LostResponse]);
        let (res, auth) = tokens("RES-1", "TOK");

        assert_eq!(platform.cancel(&res, &auth).await.unwrap().status_code, 503);
        assert_eq!(platform.state("RES-1"), Some(ReservationState::Active));

        assert_eq!(platform.cancel(&res, &auth).await, Err(TransportError::Timeout));
        assert_eq!(platform.state("RES-1"), Some(ReservationState::Cancelled));

        assert_eq!(platform.cancel(&res, &auth).await.unwrap().status_code, 409);
    }
}
