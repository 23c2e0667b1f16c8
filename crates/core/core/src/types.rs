//! Core data types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An outstanding one-time passcode for a single email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// The secret code.
    pub code: String,
    /// The normalized (lower-cased) owner email.
    pub email: String,
    /// When the code was issued.
    pub issued_at: DateTime<Utc>,
    /// When the code stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// Failed verification attempts since issuance.
    pub attempts: u32,
}

impl OtpRecord {
    /// Creates a fresh record issued at `now`.
    pub fn new(
        email: impl Into<String>,
        code: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            code: code.into(),
            email: email.into(),
            issued_at: now,
            expires_at: now + ttl,
            attempts: 0,
        }
    }

    /// Checks if the record has expired at `now`.
    ///
    /// A record is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Time elapsed since issuance.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.issued_at
    }

    /// Increments the attempt counter and returns the new value.
    pub fn record_failed_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }
}

/// Snapshot of the outstanding records, for health and debug endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpStats {
    /// Number of outstanding records.
    pub total: usize,
    /// Emails with an outstanding record, sorted.
    pub emails: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let now = Utc::now();
        let record = OtpRecord::new("a@x.com", "123456", now, Duration::minutes(3));

        assert_eq!(record.attempts, 0);
        assert_eq!(record.expires_at, now + Duration::minutes(3));
        assert!(!record.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let record = OtpRecord::new("a@x.com", "123456", now, Duration::minutes(3));

        assert!(!record.is_expired_at(record.expires_at));
        assert!(record.is_expired_at(record.expires_at + Duration::milliseconds(1)));
        assert_eq!(
            record.remaining_at(record.expires_at + Duration::minutes(1)),
            Duration::zero()
        );
    }

    #[test]
    fn test_failed_attempts() {
        let mut record = OtpRecord::new("a@x.com", "123456", Utc::now(), Duration::minutes(3));
        assert_eq!(record.record_failed_attempt(), 1);
        assert_eq!(record.record_failed_attempt(), 2);
        assert_eq!(record.attempts, 2);
    }
}
