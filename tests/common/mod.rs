//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use resy_cancel::cancellation::{
    AuthToken, CancellationTransport, PlatformResponse, ReservationToken, TransportError,
};
use resy_cancel::config::ClientConfig;

/// One scripted answer of a `ScriptedTransport`.
#[derive(Debug, Clone)]
pub enum Step {
    Respond(u16, &'static str),
    Fail(TransportError),
    /// Sleep, then answer with the next step.
    Delay(Duration),
}

/// Transport replaying a fixed script and recording when each call started.
#[derive(Clone)]
pub struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    /// Answer once the script runs out.
    fallback: Step,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `step`.
    pub fn always(step: Step) -> Self {
        Self::new([], step)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between the starts of consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl CancellationTransport for ScriptedTransport {
    async fn cancel(
        &self,
        _reservation: &ReservationToken,
        _auth: &AuthToken,
    ) -> Result<PlatformResponse, TransportError> {
        self.calls.lock().unwrap().push(Instant::now());

        let mut step = self.next_step();
        while let Step::Delay(delay) = step {
            tokio::time::sleep(delay).await;
            step = self.next_step();
        }

        match step {
            Step::Respond(code, message) => Ok(PlatformResponse::new(code, message)),
            Step::Fail(err) => Err(err),
            Step::Delay(_) => unreachable!(),
        }
    }
}

/// Deterministic config: no jitter, 100ms base doubling up to 1s.
pub fn test_config(max_attempts: u32) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.retries.max_attempts = max_attempts;
    config.retries.base_delay_ms = 100;
    config.retries.max_delay_ms = 1000;
    config.retries.backoff_multiplier = 2.0;
    config.retries.jitter_ratio = 0.0;
    config.timeouts.attempt_timeout_ms = 2000;
    config
}

/// Assert `actual` is `expected` give or take timer granularity.
pub fn assert_close(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(5);
    assert!(
        actual + slack >= expected && actual <= expected + slack,
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
