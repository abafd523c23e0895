//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::TransactionConfig;

/// Retry budget and backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl RetryPolicy {
    /// Delay before `attempt` (1-based retry number).
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }
}

impl From<&TransactionConfig> for RetryPolicy {
    fn from(config: &TransactionConfig) -> Self {
        Self {
            max_retries: config.refresh_retries,
            base_ms: config.refresh_backoff_base_ms,
            max_ms: config.refresh_backoff_max_ms,
        }
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter: 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 100, 2000), Duration::ZERO);

        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 110);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000 && max.as_millis() < 1100);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&TransactionConfig::default());
        assert_eq!(policy.max_retries, 3);
        assert!(policy.delay(1) >= Duration::from_millis(200));
    }
}
