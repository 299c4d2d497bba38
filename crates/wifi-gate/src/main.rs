//! # Wifi Gate
//!
//! Hands out a shared WiFi password to visitors who prove ownership of a
//! phone number. A code is requested for the number, delivered out-of-band,
//! and exchanged for the password plus a 24h session token the client can
//! present later to skip the flow.
//!
//! ## Architecture
//! ```text
//! Client → /api/wifi?action=… → VerificationEngine → VerificationStore
//!                                       ↓
//!                                 TokenService (HS256)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod routes;
mod state;
mod store;
mod token;
mod verification;

use crate::config::{AppConfig, Overrides};
use crate::state::AppState;

/// Wifi Gate - phone verification in front of a shared WiFi password
#[derive(Parser, Debug)]
#[command(name = "wifi-gate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/wifi-gate.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Session token signing secret (overrides config)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// WiFi password handed out after verification (overrides config)
    #[arg(long, env = "WIFI_PASSWORD", hide_env_values = true)]
    wifi_password: Option<String>,

    /// Use this fixed verification code instead of random ones
    #[arg(long, env = "FIXED_VERIFICATION_CODE", hide_env_values = true)]
    fixed_code: Option<String>,

    /// Log issued verification codes (development only)
    #[arg(long, default_value = "false")]
    reveal_codes: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before clap reads the environment
    let dotenv = dotenvy::dotenv();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("📶 Starting Wifi Gate v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    // Load configuration
    let config = AppConfig::load(&args.config, Overrides::from(&args))?;
    info!(
        code_mode = config.verification.code.mode(),
        create_on_verify = config.verification.create_on_verify,
        "📋 Configuration loaded from {}",
        args.config
    );

    // Initialize application state
    let state = AppState::new(&config);

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Wifi Gate listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("👋 Wifi Gate shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}
