//! OTP Mailer Server binary.
//!
//! Usage: `otp-mailer-server [config.toml]`. The config path can also be
//! given with `OTP_MAILER_CONFIG`.

use otp_mailer_server::{OtpServer, init_tracing, load_from_env};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env without overriding the real environment
    dotenvy::dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OTP_MAILER_CONFIG").ok());
    let config = load_from_env(path.as_deref())?;
    init_tracing(&config.server);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting OTP Mailer Server");

    let server = OtpServer::new(config)?;
    server.run().await?;

    Ok(())
}
