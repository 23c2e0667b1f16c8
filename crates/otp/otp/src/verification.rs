//! Verification outcomes.

use serde::Serialize;

/// Result of a verification attempt.
///
/// Every variant except `Verified` is a failure; none of them are
/// errors in the `Result` sense, they are ordinary outcomes the caller
/// reports back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationResult {
    /// The code matched and has been consumed.
    Verified,
    /// No outstanding code for this email.
    NotFound,
    /// The code existed but its TTL passed.
    Expired,
    /// The attempt cap was reached; the code has been discarded.
    AttemptsExhausted,
    /// Wrong code; the user may retry.
    CodeMismatch {
        /// Failed attempts so far.
        attempts: u32,
        /// Attempts left before the code is discarded.
        remaining: u32,
    },
}

impl VerificationResult {
    /// Returns true if verification was successful.
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Verified)
    }

    /// Returns the message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            VerificationResult::Verified => "OTP verified successfully",
            VerificationResult::NotFound => "OTP not found. Please request a new one.",
            VerificationResult::Expired => "OTP has expired. Please request a new one.",
            VerificationResult::AttemptsExhausted => "Too many attempts. Please request a new OTP.",
            VerificationResult::CodeMismatch { .. } => "Invalid OTP. Please try again.",
        }
    }

    /// Returns an error code for API responses.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            VerificationResult::Verified => None,
            VerificationResult::NotFound => Some("CODE_NOT_FOUND"),
            VerificationResult::Expired => Some("CODE_EXPIRED"),
            VerificationResult::AttemptsExhausted => Some("TOO_MANY_ATTEMPTS"),
            VerificationResult::CodeMismatch { .. } => Some("INVALID_CODE"),
        }
    }

    /// Whether the same code may still be retried.
    pub fn can_retry(&self) -> bool {
        matches!(self, VerificationResult::CodeMismatch { .. })
    }
}
