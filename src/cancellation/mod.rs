//! Reservation cancellation subsystem.
//!
//! # Data Flow
//! ```text
//! caller (reservation token, auth token, optional deadline)
//!     → client.rs (validate input, attempt loop)
//!     → transport.rs (one external call per attempt)
//!     → classify.rs (raw outcome → CancellationStatus)
//!     → CancellationResult back to the caller
//! ```
//!
//! # Security Constraints
//! - Auth tokens are redacted in every `Debug`/`Display` rendering
//! - Tokens are borrowed per call and never retained

pub mod classify;
pub mod client;
pub mod memory;
pub mod transport;
pub mod types;

pub use client::{CancellationClient, ReservationBroker};
pub use memory::{Fault, InMemoryPlatform, ReservationState};
pub use transport::{CancellationTransport, PlatformResponse, TransportError};
pub use types::{AuthToken, CancellationResult, CancellationStatus, RejectReason, ReservationToken};
