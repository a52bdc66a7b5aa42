//! Resilient reservation-cancellation client for the Resy platform.

pub mod cancellation;
pub mod config;
pub mod observability;
pub mod resilience;

pub use cancellation::{
    CancellationClient, CancellationResult, CancellationStatus, CancellationTransport,
    RejectReason, ReservationBroker,
};
pub use config::ClientConfig;
