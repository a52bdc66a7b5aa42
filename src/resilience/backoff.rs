//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate the delay to wait before retry number `retry` (1-based).
///
/// The undecorated delay is `base * multiplier^(retry - 1)`, capped at `max`.
/// Jitter then shaves off a random fraction in `[0, jitter_ratio)`, so the
/// result never exceeds `max`.
pub fn calculate_backoff(
    retry: u32,
    base: Duration,
    max: Duration,
    multiplier: f64,
    jitter_ratio: f64,
) -> Duration {
    let capped = nominal_delay(retry, base, max, multiplier);
    if jitter_ratio <= 0.0 || capped.is_zero() {
        return capped;
    }

    let shave = rand::thread_rng().gen_range(0.0..jitter_ratio.min(1.0));
    capped.mul_f64(1.0 - shave)
}

/// Delay before retry number `retry` without jitter.
pub fn nominal_delay(retry: u32, base: Duration, max: Duration, multiplier: f64) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
    let delay_nanos = base.as_nanos() as f64 * multiplier.powi(exponent);

    // Overflowed or non-finite growth is clamped to the cap.
    if !delay_nanos.is_finite() || delay_nanos >= max.as_nanos() as f64 {
        max
    } else {
        Duration::from_nanos(delay_nanos.max(0.0).round() as u64)
    }
}
