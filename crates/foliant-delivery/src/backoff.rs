//! Exponential backoff schedule for retried deliveries.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(60);

/// Ceiling on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

/// Default retry budget per delivery record.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Backoff parameters applied to every delivery record.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt; doubles from here.
    pub base_delay: Duration,
    /// Cap applied after doubling.
    pub max_delay: Duration,
    /// Attempts allowed before a record goes terminal.
    pub max_retries: i32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempts` failed attempts (1-based).
    ///
    /// Doubles per attempt from `base_delay`, capped at `max_delay`:
    /// attempt 1 waits `base_delay`, attempt 2 waits twice that, and so on.
    #[must_use]
    pub fn delay_after_attempts(&self, attempts: i32) -> Duration {
        // Exponent is clamped so the shift can never overflow; anything past
        // u32::MAX seconds is far beyond max_delay anyway.
        let exponent = attempts.max(1).saturating_sub(1).min(31) as u32;
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Absolute due time for the next attempt.
    #[must_use]
    pub fn next_retry_at(&self, now: DateTime<Utc>, attempts: i32) -> DateTime<Utc> {
        let delay = self.delay_after_attempts(attempts);
        now + chrono::Duration::from_std(delay)
            .unwrap_or_else(|_| chrono::Duration::seconds(self.max_delay.as_secs() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after_attempts(1), Duration::from_secs(60));
        assert_eq!(policy.delay_after_attempts(2), Duration::from_secs(120));
        assert_eq!(policy.delay_after_attempts(3), Duration::from_secs(240));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after_attempts(7), Duration::from_secs(3600));
        assert_eq!(policy.delay_after_attempts(100), Duration::from_secs(3600));
    }

    #[test]
    fn test_delays_never_decrease() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempts in 1..=64 {
            let delay = policy.delay_after_attempts(attempts);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn test_zero_attempts_treated_as_first() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after_attempts(0), Duration::from_secs(60));
    }

    #[test]
    fn test_next_retry_at_adds_delay() {
        let policy = RetryPolicy::default();
        let now = Utc::now();
        let due = policy.next_retry_at(now, 2);
        assert_eq!(due - now, chrono::Duration::seconds(120));
    }
}
