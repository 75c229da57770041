//! Sahm - Company Market Data Platform CLI
//!
//! This is the main entry point for the Sahm API server.

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/api.toml")]
    config: String,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_tracing(&args.log_level)?;

    info!("Starting Sahm v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", args.config);

    let server = sahm_api::ApiServer::new().await.map_err(|e| {
        error!("Failed to initialize API server: {}", e);
        anyhow::anyhow!("server initialization failed: {e}")
    })?;

    tokio::select! {
        result = server.serve() => {
            if let Err(e) = result {
                error!("Server exited with error: {}", e);
                return Err(anyhow::anyhow!("server error: {e}"));
            }
        }
        _ = shutdown_signal() => {}
    }

    info!("Sahm shut down gracefully");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let level_filter = match log_level.to_lowercase().as_str() {
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(EnvFilter::from_default_env().add_directive(level_filter.into()));

    tracing_subscriber::registry().with(stdout_layer).try_init()?;

    Ok(())
}

/// Wait for Ctrl+C so the server can be torn down cleanly.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!("Failed to listen for shutdown signal: {:?}", err);
        }
    }
}
