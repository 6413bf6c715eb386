use std::time::Duration;

/// Bounded exponential backoff for transient delivery failures.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Total attempts including the first (0 = never deliver).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before the given attempt (1-indexed): base * 2^(attempt-1),
    /// capped at `max_delay`.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let base_ms = self.base_delay.as_millis() as u64;
        let exp = 1u64 << (attempt - 2).min(20);
        Duration::from_millis(base_ms.saturating_mul(exp)).min(self.max_delay)
    }

    pub fn allows_attempt(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}
