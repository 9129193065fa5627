//! Delay schedule between failed sync cycles.

use std::time::Duration;

/// Largest doubling exponent; keeps `base * 2^n` far from overflow.
const MAX_DOUBLINGS: u32 = 16;

/// How long the sync loop waits after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Always wait the same amount of time.
    Fixed(Duration),
    /// Wait `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl RetryPolicy {
    /// Delay before the retry following the `attempt`-th consecutive failure.
    ///
    /// `attempt` starts at 1; 0 is treated as 1.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed(delay) => delay,
            RetryPolicy::Exponential { base, max } => {
                let doublings = attempt.saturating_sub(1).min(MAX_DOUBLINGS);
                base.saturating_mul(2u32.pow(doublings)).min(max)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed(Duration::from_millis(5000))
    }
}
