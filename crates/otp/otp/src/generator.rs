//! OTP generation utilities.

use otp_mailer_core::CodeGenerator;
use rand::Rng;
use rand::rngs::OsRng;
use std::ops::RangeInclusive;

/// Number of digits in every issued code.
pub const CODE_LENGTH: usize = 6;

/// Range codes are drawn from. The lower bound keeps every code at
/// exactly six digits without padding.
pub const CODE_RANGE: RangeInclusive<u32> = 100_000..=999_999;

/// Numeric OTP generator backed by the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtpGenerator;

impl OtpGenerator {
    /// Creates a new generator.
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for OtpGenerator {
    fn generate(&self) -> String {
        OsRng.gen_range(CODE_RANGE).to_string()
    }
}

/// Generator that always returns the same code.
///
/// Useful in tests and local demos where the code must be known upfront.
#[derive(Debug, Clone)]
pub struct FixedCodeGenerator {
    code: String,
}

impl FixedCodeGenerator {
    /// Creates a generator returning `code`.
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> String {
        self.code.clone()
    }
}
