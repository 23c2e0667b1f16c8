//! The OTP email body.

use chrono::Duration;

/// Renders the subject and bodies of the OTP message.
#[derive(Debug, Clone)]
pub struct OtpEmailTemplate {
    brand: String,
}

impl OtpEmailTemplate {
    /// Creates a template branded with `brand`.
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
        }
    }

    /// Returns the brand name.
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Returns the message subject.
    pub fn subject(&self) -> String {
        format!("Your {} Login OTP", self.brand)
    }

    /// Returns the plain-text body.
    pub fn text(&self, code: &str, ttl: Duration) -> String {
        format!(
            "Your {} OTP is: {} (valid for {}). Do not share this code with anyone.",
            self.brand,
            code,
            describe_ttl(ttl)
        )
    }

    /// Returns the HTML body.
    pub fn html(&self, code: &str, ttl: Duration) -> String {
        let brand = escape_html(&self.brand);
        let code = escape_html(code);
        let ttl = describe_ttl(ttl);

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f5f5f5;">
  <div style="max-width: 600px; margin: 0 auto; background-color: white; border-radius: 10px; padding: 30px;">
    <h2 style="color: #0f766e; margin-top: 0;">{brand} - Login OTP</h2>
    <p style="color: #333; font-size: 16px;">Your one-time password for login is:</p>
    <div style="background: #f0fdfa; border: 2px dashed #14b8a6; border-radius: 8px; padding: 20px; text-align: center; margin: 24px 0;">
      <span style="font-size: 36px; letter-spacing: 8px; color: #0f766e; font-weight: bold;">{code}</span>
    </div>
    <p style="color: #666; font-size: 14px;">This code expires in <strong>{ttl}</strong>.</p>
    <p style="color: #666; font-size: 14px;">Do not share this code with anyone.</p>
    <hr style="border: none; border-top: 1px solid #e5e7eb; margin: 24px 0;">
    <p style="color: #9ca3af; font-size: 12px; margin: 0;">This is an automated message from {brand}. Please do not reply to this email.</p>
  </div>
</body>
</html>
"#
        )
    }
}

/// Formats a TTL for humans: "3 minutes", "1 minute", "90 seconds".
pub fn describe_ttl(ttl: Duration) -> String {
    let seconds = ttl.num_seconds().max(0);
    if seconds >= 60 && seconds % 60 == 0 {
        let minutes = seconds / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else if seconds == 1 {
        "1 second".to_string()
    } else {
        format!("{seconds} seconds")
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
