//! Reconnection backoff policy.

use std::time::Duration;

/// Bounded exponential backoff for automatic reconnection.
///
/// Reconnection is triggered only by an unexpected close, never by an
/// explicit disconnect. The delay before attempt `n` (1-based) is
/// `base_delay * 2^(n-1)`; once `max_attempts` attempts have failed the
/// client stops trying until the next explicit connect. A successful
/// reconnect resets the attempt counter.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Attempt cap; no further automatic attempts happen beyond it.
    pub max_attempts: u32,
    /// Delay before the first attempt; doubles on every further attempt.
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnection attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay * 2u32.pow(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delay_sequence() {
        // テスト項目: デフォルト設定で 1s, 2s, 4s, 8s, 16s の遅延列になる
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // then (期待する結果):
        let delays: Vec<u64> = (1..=policy.max_attempts)
            .map(|attempt| policy.delay_for_attempt(attempt).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[test]
    fn test_custom_base_delay_scales() {
        // テスト項目: base_delay を変えると遅延列がスケールする
        let policy = ReconnectPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(40));
    }

    #[test]
    fn test_attempt_zero_uses_base_delay() {
        // テスト項目: 0 回目（境界値）でも base_delay を下回らない
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
    }
}
