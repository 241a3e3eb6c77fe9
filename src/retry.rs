// src/retry.rs
//! Bounded retry schedule shared by the news and trend sources.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay between every attempt.
    Fixed,
    /// Delay grows with the attempt number: `base * attempt`.
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first call; total calls = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn linear(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Linear,
        }
    }

    /// No waiting at all; handy for tests and stubs.
    pub fn immediate(max_retries: u32) -> Self {
        Self::fixed(max_retries, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear => self.base_delay.saturating_mul(attempt.max(1)),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_is_constant() {
        let p = RetryPolicy::fixed(3, Duration::from_secs(2));
        assert_eq!(p.delay_for(1), Duration::from_secs(2));
        assert_eq!(p.delay_for(3), Duration::from_secs(2));
        assert_eq!(p.total_attempts(), 4);
    }

    #[test]
    fn linear_delay_grows_with_attempt() {
        let p = RetryPolicy::linear(3, Duration::from_secs(2));
        assert_eq!(p.delay_for(1), Duration::from_secs(2));
        assert_eq!(p.delay_for(2), Duration::from_secs(4));
        assert_eq!(p.delay_for(3), Duration::from_secs(6));
    }
}
