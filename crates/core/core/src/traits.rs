//! Core traits for the OTP mailer.
//!
//! These are the seams between the OTP manager and the outside world:
//! where time comes from, where codes come from, and how a code reaches
//! the user's inbox.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::DeliveryError;

/// Source of the current time.
///
/// The manager never calls `Utc::now()` directly so that tests can
/// drive expiry deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh passcodes.
pub trait CodeGenerator: Send + Sync {
    /// Produces a new code.
    fn generate(&self) -> String;
}

/// Trait for email delivery backends.
///
/// Implementations attempt delivery and report why it failed; the
/// manager does not care how delivery happens.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Returns a short backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Sends `code` to `to`. `ttl` is only used for wording in the message.
    async fn send_otp(&self, to: &str, code: &str, ttl: Duration) -> Result<(), DeliveryError>;

    /// Checks that the backend is reachable and accepts our credentials.
    async fn test_connection(&self) -> bool;
}
