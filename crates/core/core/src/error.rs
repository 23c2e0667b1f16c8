//! Error types for the OTP mailer.
//!
//! Two error families live here: `DeliveryError`, reported by email
//! senders, and `ServiceError`, which the HTTP transport turns into
//! user-visible responses. Verification outcomes (wrong code, expired
//! code, ...) are not errors and are modelled as values elsewhere.

use thiserror::Error;

/// Why an email could not be delivered.
///
/// The `Display` text is shown to API callers, so it is phrased for
/// end users rather than operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No SMTP credentials were configured.
    #[error("Email delivery is not configured. Please contact the administrator.")]
    NotConfigured,

    /// The SMTP server rejected the credentials.
    #[error("Authentication failed. Please check your email and app password.")]
    Authentication { message: String },

    /// The SMTP server could not be reached.
    #[error("Could not connect to the SMTP server. Check your internet connection.")]
    Connection { message: String },

    /// The recipient or sender address could not be parsed.
    #[error("Invalid email address: {address}")]
    InvalidAddress { address: String },

    /// The server accepted the connection but refused the message.
    #[error("The mail server rejected the message: {message}")]
    Rejected { message: String },

    /// The message itself could not be built.
    #[error("Failed to build the OTP email: {message}")]
    Message { message: String },
}

impl DeliveryError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Returns a stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "EMAIL_NOT_CONFIGURED",
            Self::Authentication { .. } => "EMAIL_AUTH_FAILED",
            Self::Connection { .. } => "EMAIL_CONNECTION_FAILED",
            Self::InvalidAddress { .. } => "EMAIL_INVALID_ADDRESS",
            Self::Rejected { .. } => "EMAIL_REJECTED",
            Self::Message { .. } => "EMAIL_BUILD_FAILED",
        }
    }
}

/// The main error type for the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    // ==================== Validation Errors ====================
    /// The email format is invalid.
    #[error("Invalid email format")]
    InvalidEmail,

    /// One or more required fields are missing.
    #[error("{message}")]
    MissingField { message: String },

    /// The request body could not be parsed.
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },

    /// The request body is not JSON.
    #[error("Expected a JSON request body")]
    UnsupportedContentType,

    // ==================== Rate Limiting ====================
    /// A code was issued too recently for this email.
    #[error("Please wait before requesting another OTP")]
    RateLimited { retry_after_seconds: u64 },

    // ==================== Delivery Errors ====================
    /// The OTP email could not be delivered.
    #[error("{0}")]
    Delivery(#[from] DeliveryError),
}

impl ServiceError {
    /// Creates a missing field error with the given message.
    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingField {
            message: message.into(),
        }
    }

    /// Creates an invalid body error.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::InvalidBody {
            message: message.into(),
        }
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidEmail | Self::MissingField { .. } | Self::InvalidBody { .. } => 400,
            Self::UnsupportedContentType => 415,
            Self::RateLimited { .. } => 429,
            Self::Delivery(_) => 500,
        }
    }

    /// Returns a stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::InvalidBody { .. } | Self::UnsupportedContentType => "INVALID_REQUEST",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Delivery(err) => err.error_code(),
        }
    }
}
