//! Configuration for the OTP manager.

use chrono::Duration;

/// Default time-to-live for an issued code (3 minutes).
pub const DEFAULT_TTL_SECONDS: i64 = 180;

/// Default minimum delay between two sends to the same email (1 minute).
pub const DEFAULT_COOLDOWN_SECONDS: i64 = 60;

/// Default number of wrong guesses tolerated per code.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Lifecycle policy applied by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpPolicy {
    /// How long an issued code stays valid. Default: 3 minutes.
    pub ttl: Duration,
    /// Minimum time between two issuances for one email. Default: 1 minute.
    pub cooldown: Duration,
    /// Wrong guesses allowed before the code is discarded. Default: 3.
    pub max_attempts: u32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS),
            cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECONDS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl OtpPolicy {
    /// Creates a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the code TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the re-issuance cooldown.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets the attempt cap.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// TTL in whole seconds, as reported to API callers.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = OtpPolicy::default();
        assert_eq!(policy.ttl, Duration::minutes(3));
        assert_eq!(policy.cooldown, Duration::minutes(1));
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.ttl_seconds(), 180);
    }

    #[test]
    fn test_builder() {
        let policy = OtpPolicy::new()
            .ttl(Duration::minutes(10))
            .cooldown(Duration::seconds(30))
            .max_attempts(5);

        assert_eq!(policy.ttl_seconds(), 600);
        assert_eq!(policy.cooldown, Duration::seconds(30));
        assert_eq!(policy.max_attempts, 5);
    }
}
