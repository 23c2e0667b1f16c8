//! # OTP Mailer Email
//!
//! Email delivery backends implementing `otp_mailer_core::EmailSender`:
//! - `SmtpEmailSender`: authenticated SMTP via lettre (Gmail by default)
//! - `MemoryEmailSender`: in-memory outbox for tests and local runs
//! - `UnconfiguredEmailSender`: fails every send when credentials are absent

mod config;
mod memory;
mod smtp;
mod template;

pub use config::{SmtpConfig, TlsMode};
pub use memory::{MemoryEmailSender, SentOtp, UnconfiguredEmailSender};
pub use smtp::SmtpEmailSender;
pub use template::{OtpEmailTemplate, describe_ttl};

use otp_mailer_core::{DeliveryError, EmailSender};
use std::sync::Arc;

/// Picks the sender for `config`: SMTP when credentials are present,
/// otherwise the unconfigured placeholder.
///
/// Present but unusable credentials are an error rather than a silent
/// fallback.
pub fn sender_from_config(config: &SmtpConfig) -> Result<Arc<dyn EmailSender>, DeliveryError> {
    if !config.is_configured() {
        tracing::warn!("SMTP credentials not configured; OTP emails will not be sent");
        return Ok(Arc::new(UnconfiguredEmailSender));
    }

    Ok(Arc::new(SmtpEmailSender::new(config)?))
}
