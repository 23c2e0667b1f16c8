//! SMTP configuration.

use serde::{Deserialize, Serialize};

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// TLS from the first byte (SMTPS, usually port 465).
    #[default]
    Implicit,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
    /// No encryption. Only for local test servers.
    None,
}

/// Configuration for SMTP delivery.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP server hostname. Default: smtp.gmail.com.
    pub host: String,
    /// SMTP server port. Default: 465.
    pub port: u16,
    /// Connection security. Default: implicit TLS.
    pub tls: TlsMode,
    /// Account used to authenticate, also the sender address.
    pub username: Option<String>,
    /// App password for the account.
    pub password: Option<String>,
    /// Display name on outgoing mail and in the message body.
    pub sender_name: String,
    /// Network timeout in seconds. Default: 30.
    pub timeout_seconds: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
            tls: TlsMode::Implicit,
            username: None,
            password: None,
            sender_name: "ClinicOS".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl SmtpConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server host and port.
    pub fn server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Sets the TLS mode.
    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the login credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the sender display name.
    pub fn sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }

    /// Username with surrounding whitespace removed, if non-empty.
    pub fn trimmed_username(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }

    /// Password with all whitespace removed, if non-empty.
    ///
    /// App passwords are often pasted in the grouped `abcd efgh ...` form.
    pub fn normalized_password(&self) -> Option<String> {
        self.password
            .as_deref()
            .map(|p| p.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|p| !p.is_empty())
    }

    /// True when both username and password are present.
    pub fn is_configured(&self) -> bool {
        self.trimmed_username().is_some() && self.normalized_password().is_some()
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field(
                "password",
                &self.normalized_password().map(|p| format!("***({} chars)***", p.len())),
            )
            .field("sender_name", &self.sender_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
