//! SMTP self-test used by the `test-smtp` binary.

use chrono::Duration;
use otp_mailer_core::{CodeGenerator, DeliveryError, EmailSender};
use otp_mailer_email::SmtpConfig;
use otp_mailer_otp::OtpGenerator;

use crate::ServerError;

/// Verifies the SMTP connection, then sends a test OTP email to the
/// configured account itself.
///
/// Returns the address the test message went to.
pub async fn smtp_self_test(
    config: &SmtpConfig,
    sender: &dyn EmailSender,
) -> Result<String, ServerError> {
    let Some(recipient) = config.trimmed_username().filter(|_| config.is_configured()) else {
        return Err(DeliveryError::NotConfigured.into());
    };

    tracing::info!(host = %config.host, port = config.port, sender = sender.name(), "Testing SMTP connection");
    if !sender.test_connection().await {
        return Err(ServerError::SmtpUnavailable {
            host: config.host.clone(),
            port: config.port,
        });
    }
    tracing::info!("SMTP connection verified");

    let code = OtpGenerator::new().generate();
    sender.send_otp(&recipient, &code, Duration::minutes(3)).await?;
    tracing::info!(to = %recipient, "Test email sent");

    Ok(recipient)
}

/// Suggestions printed after a failed self-test.
pub fn troubleshooting_hints(err: &ServerError) -> &'static [&'static str] {
    match err {
        ServerError::Email(DeliveryError::NotConfigured) => &[
            "Set SMTP_EMAIL and SMTP_APP_PASSWORD in the environment or a .env file",
        ],
        ServerError::Email(DeliveryError::Authentication { .. }) => &[
            "Verify the email address is correct",
            "Use an App Password, not the regular account password",
            "Generate a new App Password under the account's security settings",
        ],
        ServerError::SmtpUnavailable { .. } | ServerError::Email(DeliveryError::Connection { .. }) => &[
            "Check the internet connection",
            "Make sure the SMTP port is not blocked by a firewall",
            "Try disabling any VPN",
        ],
        _ => &[],
    }
}
