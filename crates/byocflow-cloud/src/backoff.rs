//! Exponential backoff with jitter
//!
//! `wait = min_wait * 2^attempt`, clamped to `max_wait` before jitter, then
//! shifted by a uniform offset in `[-j, +j]` where `j = 0.1 * wait`.

use byocflow_config::BackoffWindow;
use rand::Rng;
use std::time::Duration;

/// Fraction of the wait used as the jitter half-width
pub const JITTER_COEFFICIENT: f64 = 0.1;

/// Backoff calculator
///
/// Immutable once built; the two presets share the algorithm and differ
/// only in their bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    min_wait: Duration,
    max_wait: Duration,
    jitter: f64,
}

impl Backoff {
    pub const fn new(min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            min_wait,
            max_wait,
            jitter: JITTER_COEFFICIENT,
        }
    }

    /// Status-wait preset: 500ms up to 10s
    pub const fn generic() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(10))
    }

    /// Network-retry preset: 2s up to 120s
    pub const fn network() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(120))
    }

    pub fn from_window(window: &BackoffWindow) -> Self {
        Self::new(
            Duration::from_millis(window.min_wait_ms),
            Duration::from_millis(window.max_wait_ms),
        )
    }

    pub fn min_wait(&self) -> Duration {
        self.min_wait
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Delay before jitter for the given attempt
    pub fn base_delay(&self, attempt: u32) -> Duration {
        // 2^attempt saturates instead of overflowing for attempt >= 32
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.min_wait.saturating_mul(factor).min(self.max_wait)
    }

    /// Jittered delay for the given attempt, using the thread-local RNG
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::thread_rng())
    }

    /// Jittered delay for the given attempt, drawing from `rng`
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let wait = self.base_delay(attempt);
        let spread = wait.as_secs_f64() * self.jitter;

        if !(spread.is_finite() && spread > 0.0) {
            return wait;
        }

        let offset = rng.gen_range(-spread..=spread);
        Duration::try_from_secs_f64(wait.as_secs_f64() + offset).unwrap_or(wait)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::generic()
    }
}
