//! # OTP Mailer Server
//!
//! Standalone email OTP service. Wires the OTP manager, the email
//! sender and the HTTP routes together, runs the periodic expiry sweep
//! and shuts down gracefully on SIGINT/SIGTERM.

mod config;
mod smtp_check;

pub use config::{
    AppConfig, ConfigError, CorsConfig, Environment, MAX_TTL_SECONDS, OtpSettings, ServerConfig,
    load_config, load_from_env, parse_config,
};
pub use smtp_check::{smtp_self_test, troubleshooting_hints};

use otp_mailer_axum::{OtpState, app};
use otp_mailer_core::{DeliveryError, EmailSender};
use otp_mailer_email::sender_from_config;
use otp_mailer_otp::OtpManager;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Email sender setup failed: {0}")]
    Email(#[from] DeliveryError),
    #[error("SMTP connection test failed for {host}:{port}")]
    SmtpUnavailable { host: String, port: u16 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The OTP server.
pub struct OtpServer {
    /// Server configuration.
    pub config: AppConfig,
    manager: Arc<OtpManager>,
    sender: Arc<dyn EmailSender>,
}

impl OtpServer {
    /// Creates a server from validated configuration.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let manager = Arc::new(OtpManager::new(config.otp.policy()));
        let sender = sender_from_config(&config.smtp)?;
        Ok(Self::with_parts(config, manager, sender))
    }

    /// Creates a server around an existing manager and sender.
    pub fn with_parts(
        config: AppConfig,
        manager: Arc<OtpManager>,
        sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            manager,
            sender,
        }
    }

    /// Gets the OTP manager.
    pub fn manager(&self) -> &Arc<OtpManager> {
        &self.manager
    }

    /// Builds the HTTP application.
    pub fn router(&self) -> Result<axum::Router, ServerError> {
        let cors = self.config.cors.origins()?.layer();
        let state = OtpState::new(self.manager.clone(), self.sender.clone());
        Ok(app(state, cors))
    }

    /// Tests the SMTP connection when credentials are configured.
    ///
    /// Without credentials the server still starts; sends then fail with
    /// a "not configured" reason.
    pub async fn check_email(&self) -> Result<(), ServerError> {
        if !self.config.smtp.is_configured() {
            tracing::warn!("SMTP_EMAIL / SMTP_APP_PASSWORD not set; OTP emails cannot be sent");
            return Ok(());
        }

        tracing::info!(sender = self.sender.name(), "Testing SMTP connection");
        if self.sender.test_connection().await {
            tracing::info!("SMTP connection verified");
            Ok(())
        } else {
            Err(ServerError::SmtpUnavailable {
                host: self.config.smtp.host.clone(),
                port: self.config.smtp.port,
            })
        }
    }

    /// Binds the configured address and serves until SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.config.log_summary();
        self.check_email().await?;

        let listener = TcpListener::bind(self.config.server.bind_address()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `shutdown` completes.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        let sweeper = spawn_sweeper(self.manager.clone(), self.config.otp.cleanup_interval());

        tracing::info!(
            address = %listener.local_addr()?,
            environment = self.config.server.environment.as_str(),
            "OTP server listening"
        );

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.abort();
        tracing::info!("OTP server stopped");
        result.map_err(ServerError::from)
    }
}

impl std::fmt::Debug for OtpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpServer")
            .field("config", &self.config)
            .field("sender", &self.sender.name())
            .finish_non_exhaustive()
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. ANSI colours are off in
/// production.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(!server.environment.is_production()),
        )
        .init();
}

/// Spawns the periodic expiry sweep.
///
/// The first sweep runs one full `every` after start.
pub fn spawn_sweeper(manager: Arc<OtpManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = manager.cleanup_expired().await;
            tracing::debug!(removed, "Periodic OTP sweep finished");
        }
    })
}

/// Completes on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
