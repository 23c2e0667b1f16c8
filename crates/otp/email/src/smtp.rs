//! SMTP delivery via lettre.

use async_trait::async_trait;
use chrono::Duration;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::{self, AsyncSmtpTransportBuilder};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use otp_mailer_core::{DeliveryError, EmailSender};

use crate::config::{SmtpConfig, TlsMode};
use crate::template::OtpEmailTemplate;

/// SMTP reply codes that mean the login was refused.
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

/// Sends OTP emails through an authenticated SMTP relay.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    template: OtpEmailTemplate,
}

impl SmtpEmailSender {
    /// Builds a sender from `config`.
    ///
    /// Fails with `NotConfigured` when credentials are missing and with
    /// `InvalidAddress` when the username is not an email address.
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let (Some(username), Some(password)) =
            (config.trimmed_username(), config.normalized_password())
        else {
            return Err(DeliveryError::NotConfigured);
        };

        let address: Address = username
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress {
                address: username.clone(),
            })?;

        let transport = transport_builder(config)?
            .port(config.port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(std::time::Duration::from_secs(config.timeout_seconds)))
            .build();

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            user = %address,
            "SMTP email sender initialized"
        );

        Ok(Self {
            transport,
            from: Mailbox::new(Some(config.sender_name.clone()), address),
            template: OtpEmailTemplate::new(config.sender_name.clone()),
        })
    }

    /// Builds the OTP message for `to`.
    pub fn build_message(&self, to: &str, code: &str, ttl: Duration) -> Result<Message, DeliveryError> {
        let recipient: Mailbox = to.parse().map_err(|_| DeliveryError::InvalidAddress {
            address: to.to_string(),
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(self.template.subject())
            .multipart(MultiPart::alternative_plain_html(
                self.template.text(code, ttl),
                self.template.html(code, ttl),
            ))
            .map_err(|e| DeliveryError::Message {
                message: e.to_string(),
            })
    }
}

fn transport_builder(config: &SmtpConfig) -> Result<AsyncSmtpTransportBuilder, DeliveryError> {
    let builder = match config.tls {
        TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
        TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
        TlsMode::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
            &config.host,
        )),
    };

    builder.map_err(|e| DeliveryError::connection(e.to_string()))
}

/// Maps a transport error to the reason reported to the user.
fn classify(err: &smtp::Error) -> DeliveryError {
    let message = err.to_string();

    if let Some(code) = err.status() {
        if AUTH_FAILURE_CODES.contains(&code.to_string().as_str()) {
            return DeliveryError::Authentication { message };
        }
    }

    if err.is_permanent() || err.is_transient() {
        DeliveryError::Rejected { message }
    } else {
        DeliveryError::Connection { message }
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send_otp(&self, to: &str, code: &str, ttl: Duration) -> Result<(), DeliveryError> {
        let message = self.build_message(to, code, ttl)?;

        tracing::debug!(to = %to, "Sending OTP email");
        match self.transport.send(message).await {
            Ok(response) => {
                tracing::info!(
                    to = %to,
                    code = %response.code(),
                    "OTP email sent"
                );
                Ok(())
            }
            Err(err) => {
                let reason = classify(&err);
                tracing::error!(to = %to, error = %err, reason = %reason, "SMTP send failed");
                Err(reason)
            }
        }
    }

    async fn test_connection(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(true) => {
                tracing::info!("SMTP connection test successful");
                true
            }
            Ok(false) => {
                tracing::error!("SMTP connection test failed: server did not respond");
                false
            }
            Err(err) => {
                tracing::error!(error = %err, reason = %classify(&err), "SMTP connection test failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for SmtpEmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEmailSender")
            .field("from", &self.from.to_string())
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
