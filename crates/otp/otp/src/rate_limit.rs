//! Re-issuance cooldown.
//!
//! The cooldown is measured from the record's `issued_at`, so it stays
//! correct whatever TTL the record was stored with.

use chrono::{DateTime, Duration, Utc};
use otp_mailer_core::OtpRecord;

/// Result of a cooldown check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CooldownResult {
    /// A new code may be issued.
    Allowed,
    /// A code was issued too recently.
    Limited {
        /// When a new code may be issued.
        reset_at: DateTime<Utc>,
        /// How long to wait before retrying.
        retry_after: Duration,
    },
}

impl CooldownResult {
    /// Returns true if a new code may be issued.
    pub fn is_allowed(&self) -> bool {
        matches!(self, CooldownResult::Allowed)
    }

    /// Returns true if issuance is rate limited.
    pub fn is_limited(&self) -> bool {
        matches!(self, CooldownResult::Limited { .. })
    }

    /// Seconds to wait, rounded up; zero when allowed.
    pub fn retry_after_seconds(&self) -> u64 {
        match self {
            CooldownResult::Allowed => 0,
            CooldownResult::Limited { retry_after, .. } => {
                let millis = retry_after.num_milliseconds().max(0) as u64;
                millis.div_ceil(1000)
            }
        }
    }
}

/// Decides whether `record` still blocks a new issuance at `now`.
///
/// Expired records never block: the user could not use them anyway.
pub fn check_cooldown(
    record: Option<&OtpRecord>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> CooldownResult {
    let Some(record) = record else {
        return CooldownResult::Allowed;
    };

    if record.is_expired_at(now) {
        return CooldownResult::Allowed;
    }

    let reset_at = record.issued_at + cooldown;
    if now < reset_at {
        CooldownResult::Limited {
            reset_at,
            retry_after: reset_at - now,
        }
    } else {
        CooldownResult::Allowed
    }
}
