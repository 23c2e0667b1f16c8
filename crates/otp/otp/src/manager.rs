//! The OTP lifecycle manager.
//!
//! Owns the mapping from normalized email to its single outstanding
//! code. Every read-modify-write sequence (check attempts then
//! increment, check expiry then delete) runs under one write guard, so
//! concurrent requests for the same email cannot lose updates.

use chrono::{DateTime, Duration, Utc};
use otp_mailer_core::{Clock, CodeGenerator, OtpRecord, OtpStats, normalize_email};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::SystemClock;
use crate::config::OtpPolicy;
use crate::generator::OtpGenerator;
use crate::rate_limit::{CooldownResult, check_cooldown};
use crate::verification::VerificationResult;

/// A freshly issued code, returned to the caller for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    /// Normalized email the code belongs to.
    pub email: String,
    /// The code to deliver.
    pub code: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// TTL the code was stored with.
    pub expires_in: Duration,
}

/// Issues, stores, and verifies one-time passcodes.
pub struct OtpManager {
    records: RwLock<HashMap<String, OtpRecord>>,
    policy: OtpPolicy,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn CodeGenerator>,
}

impl OtpManager {
    /// Creates a manager using wall-clock time and the OS random source.
    pub fn new(policy: OtpPolicy) -> Self {
        Self::with_parts(policy, Arc::new(SystemClock), Arc::new(OtpGenerator::new()))
    }

    /// Creates a manager with an injected clock and code generator.
    pub fn with_parts(
        policy: OtpPolicy,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            policy,
            clock,
            generator,
        }
    }

    /// Gets the lifecycle policy.
    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    /// Generates a new code without storing it.
    pub fn generate(&self) -> String {
        self.generator.generate()
    }

    /// Stores `code` for `email`, replacing any outstanding code.
    pub async fn store(&self, email: &str, code: &str, ttl: Duration) -> DateTime<Utc> {
        let key = normalize_email(email);
        let record = OtpRecord::new(key.clone(), code, self.clock.now(), ttl);
        let expires_at = record.expires_at;

        let replaced = self.records.write().await.insert(key.clone(), record);
        tracing::debug!(
            email = %key,
            expires_at = %expires_at,
            replaced = replaced.is_some(),
            "OTP stored"
        );

        expires_at
    }

    /// Generates and stores a code using the policy TTL.
    pub async fn issue(&self, email: &str) -> IssuedOtp {
        let code = self.generate();
        let expires_at = self.store(email, &code, self.policy.ttl).await;

        IssuedOtp {
            email: normalize_email(email),
            code,
            expires_at,
            expires_in: self.policy.ttl,
        }
    }

    /// Issues a code unless one was issued within the policy cooldown.
    ///
    /// The cooldown check and the store happen under one write guard, so
    /// two concurrent sends for the same email cannot both pass.
    pub async fn try_issue(&self, email: &str) -> Result<IssuedOtp, CooldownResult> {
        let key = normalize_email(email);
        let now = self.clock.now();
        let mut records = self.records.write().await;

        let cooldown = check_cooldown(records.get(&key), self.policy.cooldown, now);
        if cooldown.is_limited() {
            tracing::debug!(email = %key, "OTP issuance rate limited");
            return Err(cooldown);
        }

        let code = self.generate();
        let record = OtpRecord::new(key.clone(), code.clone(), now, self.policy.ttl);
        let expires_at = record.expires_at;
        records.insert(key.clone(), record);
        tracing::debug!(email = %key, expires_at = %expires_at, "OTP issued");

        Ok(IssuedOtp {
            email: key,
            code,
            expires_at,
            expires_in: self.policy.ttl,
        })
    }

    /// Checks `input` against the outstanding code for `email`.
    ///
    /// Fails closed: anything other than a live, matching code is a
    /// failure. A matching code is consumed.
    pub async fn verify(&self, email: &str, input: &str) -> VerificationResult {
        let key = normalize_email(email);
        let now = self.clock.now();
        let mut records = self.records.write().await;

        let Some(record) = records.get_mut(&key) else {
            return VerificationResult::NotFound;
        };

        let result = if record.is_expired_at(now) {
            records.remove(&key);
            VerificationResult::Expired
        } else if record.attempts >= self.policy.max_attempts {
            records.remove(&key);
            VerificationResult::AttemptsExhausted
        } else if record.code != input {
            let attempts = record.record_failed_attempt();
            if attempts >= self.policy.max_attempts {
                records.remove(&key);
                VerificationResult::AttemptsExhausted
            } else {
                VerificationResult::CodeMismatch {
                    attempts,
                    remaining: self.policy.max_attempts - attempts,
                }
            }
        } else {
            records.remove(&key);
            VerificationResult::Verified
        };
        drop(records);

        match result {
            VerificationResult::Verified => tracing::info!(email = %key, "OTP verified"),
            other => tracing::debug!(email = %key, outcome = ?other, "OTP verification failed"),
        }

        result
    }

    /// Checks the re-issuance cooldown for `email`.
    pub async fn check_cooldown(&self, email: &str, cooldown: Duration) -> CooldownResult {
        let key = normalize_email(email);
        let records = self.records.read().await;
        check_cooldown(records.get(&key), cooldown, self.clock.now())
    }

    /// True while a code issued for `email` is younger than `cooldown`.
    pub async fn has_recent_otp(&self, email: &str, cooldown: Duration) -> bool {
        self.check_cooldown(email, cooldown).await.is_limited()
    }

    /// Time left in the policy cooldown for `email`, if any.
    pub async fn cooldown_remaining(&self, email: &str) -> Option<Duration> {
        match self.check_cooldown(email, self.policy.cooldown).await {
            CooldownResult::Limited { retry_after, .. } => Some(retry_after),
            CooldownResult::Allowed => None,
        }
    }

    /// Removes the record for `email` only if it still holds `code`.
    ///
    /// Returns whether a record was removed. A newer code issued in the
    /// meantime is left alone.
    pub async fn revoke(&self, email: &str, code: &str) -> bool {
        let key = normalize_email(email);
        let mut records = self.records.write().await;

        if records.get(&key).is_some_and(|r| r.code == code) {
            records.remove(&key);
            tracing::debug!(email = %key, "OTP revoked");
            true
        } else {
            false
        }
    }

    /// Deletes every expired record and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.write().await;

        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        let removed = before - records.len();
        drop(records);

        if removed > 0 {
            tracing::info!(removed, "Cleaned up expired OTPs");
        }

        removed
    }

    /// Returns the current record count and the emails holding them.
    pub async fn stats(&self) -> OtpStats {
        let records = self.records.read().await;
        let mut emails: Vec<String> = records.keys().cloned().collect();
        emails.sort();

        OtpStats {
            total: records.len(),
            emails,
        }
    }

    /// Returns a copy of the outstanding record for `email`.
    pub async fn get(&self, email: &str) -> Option<OtpRecord> {
        let key = normalize_email(email);
        self.records.read().await.get(&key).cloned()
    }
}

impl Default for OtpManager {
    fn default() -> Self {
        Self::new(OtpPolicy::default())
    }
}

impl std::fmt::Debug for OtpManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpManager")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::generator::FixedCodeGenerator;

    fn manager_with(code: &str) -> (OtpManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = OtpManager::with_parts(
            OtpPolicy::default(),
            clock.clone(),
            Arc::new(FixedCodeGenerator::new(code)),
        );
        (manager, clock)
    }

    #[tokio::test]
    async fn test_store_normalizes_email() {
        let (manager, _) = manager_with("123456");
        manager.store("Alice@Example.com", "123456", Duration::minutes(3)).await;

        let record = manager.get("alice@example.com").await.unwrap();
        assert_eq!(record.email, "alice@example.com");
        assert_eq!(record.attempts, 0);
        assert_eq!(
            manager.verify("ALICE@EXAMPLE.COM", "123456").await,
            VerificationResult::Verified
        );
    }

    #[tokio::test]
    async fn test_issue_uses_policy_ttl() {
        let (manager, clock) = manager_with("654321");
        let issued = manager.issue("a@x.com").await;

        assert_eq!(issued.code, "654321");
        assert_eq!(issued.expires_in, Duration::minutes(3));
        assert_eq!(issued.expires_at, clock.now() + Duration::minutes(3));
    }

    #[tokio::test]
    async fn test_mismatch_reports_remaining() {
        let (manager, _) = manager_with("111111");
        manager.issue("b@x.com").await;

        assert_eq!(
            manager.verify("b@x.com", "000000").await,
            VerificationResult::CodeMismatch {
                attempts: 1,
                remaining: 2
            }
        );
        assert_eq!(manager.get("b@x.com").await.unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn test_pre_exhausted_record_is_discarded() {
        let (manager, _) = manager_with("111111");
        manager.issue("b@x.com").await;
        manager
            .records
            .write()
            .await
            .get_mut("b@x.com")
            .unwrap()
            .attempts = 3;

        assert_eq!(
            manager.verify("b@x.com", "111111").await,
            VerificationResult::AttemptsExhausted
        );
        assert!(manager.get("b@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_verify_at_exact_expiry_succeeds() {
        let (manager, clock) = manager_with("222222");
        manager.issue("c@x.com").await;

        clock.advance(Duration::minutes(3));
        assert!(manager.verify("c@x.com", "222222").await.is_valid());
    }

    #[tokio::test]
    async fn test_revoke_only_matching_code() {
        let (manager, _) = manager_with("333333");
        manager.issue("d@x.com").await;

        assert!(!manager.revoke("d@x.com", "999999").await);
        assert!(manager.revoke("D@x.com", "333333").await);
        assert!(manager.get("d@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_cooldown_remaining() {
        let (manager, clock) = manager_with("555555");
        assert!(manager.cooldown_remaining("e@x.com").await.is_none());

        manager.issue("e@x.com").await;
        clock.advance(Duration::seconds(20));
        assert_eq!(
            manager.cooldown_remaining("e@x.com").await,
            Some(Duration::seconds(40))
        );
    }

    #[tokio::test]
    async fn test_stats_sorted() {
        let (manager, _) = manager_with("444444");
        manager.issue("zed@x.com").await;
        manager.issue("amy@x.com").await;

        let stats = manager.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.emails, vec!["amy@x.com", "zed@x.com"]);
    }
}
