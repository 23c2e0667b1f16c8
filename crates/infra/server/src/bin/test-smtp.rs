//! SMTP diagnostic: checks credentials, verifies the connection and
//! sends a test OTP email to the configured account.
//!
//! Usage: `test-smtp [config.toml]`. Reads `.env` and `OTP_MAILER_CONFIG`
//! the same way as `otp-mailer-server`. Exits non-zero on failure.

use otp_mailer_email::sender_from_config;
use otp_mailer_server::{ServerError, init_tracing, load_from_env, smtp_self_test, troubleshooting_hints};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OTP_MAILER_CONFIG").ok());
    let config = match load_from_env(path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.server);

    tracing::info!(
        username = ?config.smtp.trimmed_username(),
        password_set = config.smtp.normalized_password().is_some(),
        "SMTP credentials"
    );

    let result = match sender_from_config(&config.smtp) {
        Ok(sender) => smtp_self_test(&config.smtp, sender.as_ref()).await,
        Err(err) => Err(ServerError::from(err)),
    };

    match result {
        Ok(recipient) => {
            tracing::info!(to = %recipient, "SMTP is ready to use");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "SMTP test failed");
            for hint in troubleshooting_hints(&err) {
                tracing::error!("  - {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
