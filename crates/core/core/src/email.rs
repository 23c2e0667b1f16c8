//! Email address helpers shared by the manager and the transport.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Normalizes an email into the key used for record lookup.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Checks the basic `local@domain.tld` shape.
///
/// This is a format check only; deliverability is up to the sender.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
