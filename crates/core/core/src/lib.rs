//! # OTP Mailer Core
//!
//! This crate provides the foundational types and traits for the OTP
//! mailer. It defines the outstanding-code record (`OtpRecord`), error
//! types, and the collaborator traits (`Clock`, `CodeGenerator`,
//! `EmailSender`) that the manager and the server wire together.

pub mod email;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use email::{is_valid_email, normalize_email};
pub use error::{DeliveryError, ServiceError};
pub use traits::{Clock, CodeGenerator, EmailSender};
pub use types::{OtpRecord, OtpStats};
