//! Non-SMTP senders: an in-memory outbox and a placeholder for missing
//! credentials.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use otp_mailer_core::{DeliveryError, EmailSender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// A message captured by `MemoryEmailSender`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentOtp {
    pub to: String,
    pub code: String,
    pub ttl: Duration,
    pub sent_at: DateTime<Utc>,
}

/// Email sender that keeps messages in memory.
///
/// Intended for tests and local development. Clones share the same
/// outbox.
#[derive(Debug, Clone, Default)]
pub struct MemoryEmailSender {
    outbox: Arc<Mutex<Vec<SentOtp>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryEmailSender {
    /// Creates an empty sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns all captured messages.
    pub async fn sent(&self) -> Vec<SentOtp> {
        self.outbox.lock().await.clone()
    }

    /// Returns the most recent code sent to `to`.
    pub async fn last_code_for(&self, to: &str) -> Option<String> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.to.eq_ignore_ascii_case(to))
            .map(|m| m.code.clone())
    }

    /// Clears the outbox.
    pub async fn clear(&self) {
        self.outbox.lock().await.clear();
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn send_otp(&self, to: &str, code: &str, ttl: Duration) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::connection("memory sender set to fail"));
        }

        self.outbox.lock().await.push(SentOtp {
            to: to.to_string(),
            code: code.to_string(),
            ttl,
            sent_at: Utc::now(),
        });
        tracing::debug!(to = %to, "OTP captured in memory outbox");
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

/// Sender used when no SMTP credentials are configured.
///
/// Every send fails with `NotConfigured`, so the API reports a clear
/// reason instead of an opaque SMTP error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredEmailSender;

#[async_trait]
impl EmailSender for UnconfiguredEmailSender {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    async fn send_otp(&self, to: &str, _code: &str, _ttl: Duration) -> Result<(), DeliveryError> {
        tracing::warn!(to = %to, "Cannot send OTP: SMTP credentials are not configured");
        Err(DeliveryError::NotConfigured)
    }

    async fn test_connection(&self) -> bool {
        false
    }
}
