//! Per-call spans.
//!
//! Every `cancel` call runs inside one span carrying a fresh `call_id`, so the
//! log lines of its attempts and retries can be correlated.

use tracing::Span;
use uuid::Uuid;

use crate::cancellation::types::ReservationToken;

pub fn call_span(reservation: &ReservationToken) -> Span {
    tracing::info_span!(
        "cancel_reservation",
        call_id = %Uuid::new_v4(),
        reservation = %reservation,
    )
}
