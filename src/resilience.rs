//! Retry and circuit-breaker policies for calls to the forecasting service.
//!
//! Both policies live at the transport boundary. Retries wrap the whole call;
//! the breaker is consulted on every individual attempt, so an open circuit
//! stops a retry loop immediately.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry and breaker settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further retry.
    pub backoff_base: Duration,
    /// Consecutive failures that open the circuit.
    pub breaker_threshold: u32,
    /// Time the circuit stays open before admitting a trial call.
    pub breaker_cooldown: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
            breaker_threshold: 5,
            breaker_cooldown: Duration::from_secs(30),
        }
    }
}

impl ResilienceConfig {
    /// Delay before retry number `retry` (1-based): `backoff_base * 2^(retry - 1)`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

/// Decides whether a failed attempt is worth repeating.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` retries have been spent.
pub async fn with_retry<F, Fut, T, E>(config: &ResilienceConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if retries > 0 {
                    debug!(retries, "Operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(error) => {
                if retries >= config.max_retries || !error.is_retryable() {
                    warn!(attempts = retries + 1, error = %error, "Giving up");
                    return Err(error);
                }

                retries += 1;
                let delay = config.backoff_delay(retries);
                warn!(
                    attempt = retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected until the cooldown elapses.
    Open,
    /// One trial call is allowed through; others are rejected until it settles.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Failure-counting circuit breaker.
///
/// The internal lock is only held for bookkeeping and never across an await.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(config.breaker_threshold, config.breaker_cooldown)
    }

    /// Whether a call may go out now.
    ///
    /// An expired open circuit moves to half-open and admits exactly one
    /// trial call. Every admitted call must be settled with
    /// [`record_success`](Self::record_success),
    /// [`record_failure`](Self::record_failure) or
    /// [`release`](Self::release).
    pub fn try_acquire(&self) -> bool {
        let mut guard = self.lock();

        match guard.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if guard.trial_in_flight {
                    return false;
                }
                debug!("Circuit half-open, admitting trial call");
                guard.trial_in_flight = true;
                true
            }
            CircuitState::Open => {
                let cooled_down = guard
                    .opened_at
                    .is_none_or(|opened| opened.elapsed() >= self.cooldown);
                if cooled_down {
                    debug!("Circuit half-open, admitting trial call");
                    guard.state = CircuitState::HalfOpen;
                    guard.trial_in_flight = true;
                }
                cooled_down
            }
        }
    }

    pub fn record_success(&self) {
        let mut guard = self.lock();
        if guard.state != CircuitState::Closed {
            debug!("Circuit closed");
        }
        guard.state = CircuitState::Closed;
        guard.consecutive_failures = 0;
        guard.opened_at = None;
        guard.trial_in_flight = false;
    }

    /// Settle an admitted call whose outcome says nothing about the service's
    /// health. A half-open circuit stays half-open and the next caller
    /// becomes the trial.
    pub fn release(&self) {
        self.lock().trial_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut guard = self.lock();
        guard.consecutive_failures = guard.consecutive_failures.saturating_add(1);
        guard.trial_in_flight = false;

        let trip = match guard.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => guard.consecutive_failures >= self.threshold,
            CircuitState::Open => false,
        };

        if trip {
            warn!(
                failures = guard.consecutive_failures,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit opened"
            );
            guard.state = CircuitState::Open;
            guard.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
