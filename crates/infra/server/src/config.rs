//! Server configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables (after `.env` has been loaded by the binary).

use chrono::Duration;
use otp_mailer_axum::CorsOrigins;
use otp_mailer_email::SmtpConfig;
use otp_mailer_otp::{
    DEFAULT_COOLDOWN_SECONDS, DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL_SECONDS, OtpPolicy,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Longest accepted code TTL (one day).
pub const MAX_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::invalid_value("APP_ENV", other)),
        }
    }
}

/// Server-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Deployment environment.
    pub environment: Environment,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "0.0.0.0".to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// The `host:port` pair to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// OTP lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpSettings {
    /// Code lifetime in seconds.
    pub ttl_seconds: u64,
    /// Minimum seconds between two sends to one email.
    pub cooldown_seconds: u64,
    /// Wrong guesses allowed per code.
    pub max_attempts: u32,
    /// Seconds between expiry sweeps.
    pub cleanup_interval_seconds: u64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS as u64,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS as u64,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cleanup_interval_seconds: 5 * 60,
        }
    }
}

impl OtpSettings {
    /// Builds the manager policy. Call after `AppConfig::validate`.
    pub fn policy(&self) -> OtpPolicy {
        let ttl = self.ttl_seconds.min(MAX_TTL_SECONDS) as i64;
        let cooldown = self.cooldown_seconds.min(MAX_TTL_SECONDS) as i64;

        OtpPolicy::new()
            .ttl(Duration::seconds(ttl))
            .cooldown(Duration::seconds(cooldown))
            .max_attempts(self.max_attempts)
    }

    /// Interval of the background expiry sweep.
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_seconds)
    }
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins matched exactly.
    pub allowed_origins: Vec<String>,
    /// Regex patterns matched against the origin.
    pub allowed_origin_patterns: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8081".to_string(),
                "http://localhost:19006".to_string(),
                "exp://localhost:8081".to_string(),
            ],
            allowed_origin_patterns: vec![
                r"^exp://.*".to_string(),
                r"^http://192\.168\.\d+\.\d+:\d+$".to_string(),
            ],
        }
    }
}

impl CorsConfig {
    /// Compiles the origin list.
    pub fn origins(&self) -> Result<CorsOrigins, ConfigError> {
        CorsOrigins::new(
            self.allowed_origins.iter().cloned(),
            &self.allowed_origin_patterns,
        )
        .map_err(|e| ConfigError::Invalid(format!("invalid CORS origin pattern: {e}")))
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub otp: OtpSettings,
    pub smtp: SmtpConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_var(&get, "PORT")? {
            self.server.port = port;
        }
        if let Some(environment) = get("APP_ENV") {
            self.server.environment = environment.parse()?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.server.log_level = level;
        }

        // SMTP
        if let Some(host) = get("SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Some(port) = parse_var(&get, "SMTP_PORT")? {
            self.smtp.port = port;
        }
        if let Some(email) = get("SMTP_EMAIL") {
            self.smtp.username = Some(email);
        }
        if let Some(password) = get("SMTP_APP_PASSWORD") {
            self.smtp.password = Some(password);
        }
        if let Some(name) = get("SMTP_SENDER_NAME") {
            self.smtp.sender_name = name;
        }

        // OTP
        if let Some(ttl) = parse_var(&get, "OTP_TTL_SECONDS")? {
            self.otp.ttl_seconds = ttl;
        }
        if let Some(cooldown) = parse_var(&get, "OTP_COOLDOWN_SECONDS")? {
            self.otp.cooldown_seconds = cooldown;
        }
        if let Some(attempts) = parse_var(&get, "OTP_MAX_ATTEMPTS")? {
            self.otp.max_attempts = attempts;
        }
        if let Some(interval) = parse_var(&get, "OTP_CLEANUP_INTERVAL_SECONDS")? {
            self.otp.cleanup_interval_seconds = interval;
        }

        // CORS
        if let Some(origins) = get("CORS_ALLOWED_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(())
    }

    /// Checks the configuration for values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let otp = &self.otp;

        if otp.ttl_seconds == 0 {
            return Err(ConfigError::Invalid("OTP TTL must be positive".into()));
        }
        if otp.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "OTP TTL must be at most {MAX_TTL_SECONDS} seconds"
            )));
        }
        if otp.cooldown_seconds > otp.ttl_seconds {
            return Err(ConfigError::Invalid(
                "OTP cooldown must not exceed the TTL".into(),
            ));
        }
        if otp.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "OTP max attempts must be at least 1".into(),
            ));
        }
        if otp.cleanup_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "OTP cleanup interval must be positive".into(),
            ));
        }

        self.cors.origins()?;
        Ok(())
    }

    /// Logs the effective configuration. Secrets are never printed.
    pub fn log_summary(&self) {
        tracing::info!(
            bind = %self.server.bind_address(),
            environment = self.server.environment.as_str(),
            "Server configuration"
        );
        tracing::info!(
            ttl_seconds = self.otp.ttl_seconds,
            cooldown_seconds = self.otp.cooldown_seconds,
            max_attempts = self.otp.max_attempts,
            cleanup_interval_seconds = self.otp.cleanup_interval_seconds,
            "OTP policy"
        );
        tracing::info!(
            host = %self.smtp.host,
            port = self.smtp.port,
            username = ?self.smtp.trimmed_username(),
            password_set = self.smtp.normalized_password().is_some(),
            "SMTP configuration"
        );
    }
}

fn parse_var<G, T>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid_value(key, raw)),
        None => Ok(None),
    }
}

/// Loads configuration from a TOML file, or defaults when `path` is `None`.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Loads the file at `path` (if any), applies environment overrides
/// and validates the result.
pub fn load_from_env(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut config = load_config(path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
