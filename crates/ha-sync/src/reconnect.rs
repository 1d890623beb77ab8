//! Reconnect policy for the Home Assistant WebSocket subscriber: a flat
//! delay after any drop or authentication failure.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    pub delay: Duration,
    /// `0` means unlimited retries.
    pub max_attempts: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: 0,
        }
    }
}

impl ReconnectBackoff {
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.delay
    }

    pub fn should_give_up(&self, attempt: u32) -> bool {
        self.max_attempts > 0 && attempt >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let p = ReconnectBackoff::default();
        assert_eq!(p.delay, Duration::from_secs(5));
        assert_eq!(p.max_attempts, 0);
    }

    #[test]
    fn delay_is_flat_across_attempts() {
        let p = ReconnectBackoff::default();
        assert_eq!(p.delay_for_attempt(0), p.delay_for_attempt(10));
    }

    #[test]
    fn should_give_up_when_limited() {
        let p = ReconnectBackoff {
            max_attempts: 5,
            ..Default::default()
        };
        assert!(!p.should_give_up(4));
        assert!(p.should_give_up(5));
    }
}
