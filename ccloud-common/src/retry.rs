//! Retry policy for rate-limited responses.
//!
//! The schedule is fixed up front: the first attempt runs immediately, every
//! following attempt waits `initial_delay * multiplier^(n-1)`. With the
//! defaults that is 0, 100, 200, 400, 800, 1600 and 3200 milliseconds, seven
//! attempts in total and roughly 6.3 seconds of waiting in the worst case.
//!
//! Only outcomes the caller flags as throttled are retried. Errors and every
//! other outcome end the loop immediately.

use crate::PlatformError;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: usize,
    /// Wait before the second attempt
    pub initial_delay: Duration,
    /// Growth factor applied to the wait after every attempt
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            initial_delay: Duration::from_millis(100),
            multiplier: 2,
        }
    }
}

impl RetryConfig {
    /// Set the total number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the wait before the second attempt.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the growth factor.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }
}

/// Something that can wait.
///
/// Injected into [`RetryPolicy`] so tests can observe the waits without
/// actually sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync + fmt::Debug {
    /// Wait for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Sleeper that returns immediately and remembers every requested wait.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Create a new recording sleeper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far, in order.
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .map(|waits| waits.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// Progress through a retry schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: usize,
    waited: Duration,
}

impl RetryState {
    /// Number of attempts started so far.
    #[must_use]
    pub const fn attempt(&self) -> usize {
        self.attempt
    }

    /// Total time spent waiting so far.
    #[must_use]
    pub const fn waited(&self) -> Duration {
        self.waited
    }

    /// State after waiting `delay` and starting the next attempt.
    #[must_use]
    pub fn advance(self, delay: Duration) -> Self {
        Self {
            attempt: self.attempt + 1,
            waited: self.waited + delay,
        }
    }
}

/// Retry policy for executing operations that may be rate limited.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Create a retry policy with the default schedule.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Replace the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Wait scheduled before the given zero-based attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = u32::try_from(attempt - 1).unwrap_or(u32::MAX);
        let factor = self.config.multiplier.saturating_pow(exponent);
        self.config.initial_delay.saturating_mul(factor)
    }

    /// The complete schedule of waits, one per attempt.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.config.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }

    /// Wait before the next attempt, or `None` once the schedule is spent.
    #[must_use]
    pub fn next_delay(&self, state: &RetryState) -> Option<Duration> {
        (state.attempt < self.config.max_attempts).then(|| self.delay_for_attempt(state.attempt))
    }

    /// Get the maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.config.max_attempts
    }

    /// Execute an async operation, retrying while `is_throttled` flags the outcome.
    ///
    /// Each attempt is preceded by its scheduled wait, the first one included.
    ///
    /// # Errors
    ///
    /// Returns the operation's error as soon as one occurs, or
    /// [`PlatformError::RetriesExhausted`] when every attempt was throttled.
    pub async fn execute<F, Fut, T, E, P>(&self, mut operation: F, is_throttled: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
        E: From<PlatformError>,
    {
        let mut state = RetryState::default();
        while let Some(delay) = self.next_delay(&state) {
            self.sleeper.sleep(delay).await;
            state = state.advance(delay);

            let outcome = operation().await?;
            if !is_throttled(&outcome) {
                return Ok(outcome);
            }
            debug!(attempt = state.attempt(), "Rate limited, backing off");
        }

        warn!(
            attempts = state.attempt(),
            waited_ms = u64::try_from(state.waited().as_millis()).unwrap_or(u64::MAX),
            "Exhausted retries"
        );
        Err(PlatformError::retries_exhausted(state.attempt(), state.waited()).into())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
