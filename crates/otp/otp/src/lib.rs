//! # OTP Mailer OTP
//!
//! One-time passcode lifecycle for the OTP mailer. This crate provides:
//! - OTP generation (6-digit numeric, OS random source)
//! - The `OtpManager`: storage with expiry, attempt-limited verification,
//!   cooldown checks and the expiry sweep
//! - Clocks for production and for tests
//!
//! Each email has at most one outstanding code:
//!
//! ```text
//! NO_RECORD --store--> PENDING --correct code--> VERIFIED  --> NO_RECORD
//!                        |  ^ --ttl elapsed----> EXPIRED   --> NO_RECORD
//!                        |  | --cap reached----> EXHAUSTED --> NO_RECORD
//!                        +--+ wrong code / new store
//! ```

mod clock;
mod config;
mod generator;
mod manager;
mod rate_limit;
mod verification;

pub use clock::{ManualClock, SystemClock};
pub use config::{
    DEFAULT_COOLDOWN_SECONDS, DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL_SECONDS, OtpPolicy,
};
pub use generator::{CODE_LENGTH, CODE_RANGE, FixedCodeGenerator, OtpGenerator};
pub use manager::{IssuedOtp, OtpManager};
pub use rate_limit::{CooldownResult, check_cooldown};
pub use verification::VerificationResult;
