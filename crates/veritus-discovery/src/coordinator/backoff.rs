//! Poll scheduling policy.

use std::time::Duration;

/// Default delay before the second status request.
pub const INITIAL_DELAY: Duration = Duration::from_millis(2000);

/// Growth factor applied after each pending response.
pub const MULTIPLIER: f64 = 1.5;

/// Ceiling for the pending backoff.
pub const MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Fixed wait after a 429 response.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(15_000);

/// Timing rules for a polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first pending response.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each pending response.
    pub multiplier: f64,
    /// Upper bound for the pending delay.
    pub max_delay: Duration,
    /// Wait before retrying a rate-limited request.
    pub rate_limit_delay: Duration,
    /// Give up after this many status requests. `None` polls until a terminal state.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// Millisecond-scale policy for tests against mock servers.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            multiplier: MULTIPLIER,
            max_delay: Duration::from_millis(50),
            rate_limit_delay: Duration::from_millis(20),
            max_attempts: None,
        }
    }

    /// Same policy with an attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: INITIAL_DELAY,
            multiplier: MULTIPLIER,
            max_delay: MAX_DELAY,
            rate_limit_delay: RATE_LIMIT_DELAY,
            max_attempts: None,
        }
    }
}

/// Multiplicative backoff with a ceiling. Deterministic, no jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    multiplier: f64,
    max: Duration,
    steps: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: &PollPolicy) -> Self {
        // Delays never shrink; NaN and factors below one hold the delay steady.
        let multiplier = if policy.multiplier.is_nan() { 1.0 } else { policy.multiplier.max(1.0) };
        Self {
            current: policy.initial_delay.min(policy.max_delay),
            multiplier,
            max: policy.max_delay,
            steps: 0,
        }
    }

    /// Delay to wait before the next request.
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// Number of times the delay has been advanced.
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// Grow the delay after a pending response: `min(current * multiplier, max)`.
    pub fn advance(&mut self) {
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .map_or(self.max, |next| next.min(self.max));
        self.steps += 1;
    }
}
