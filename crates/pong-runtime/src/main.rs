//! Awala pong responder.

use anyhow::{Context, Result};
use clap::Parser;
use pong_gateway::ServiceMode;
use pong_runtime::{load_config_from, PongContainer};
use pong_telemetry::{init_telemetry, TelemetryConfig};
use std::net::IpAddr;
use tracing::{error, info};

/// Answers Awala pings with pongs.
#[derive(Parser, Debug)]
#[command(name = "pong-runtime", version, about, long_about = None)]
struct Cli {
    /// Address to bind (overrides PONG_HTTP_HOST)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind (overrides PONG_HTTP_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Generation to run: events or parcels (overrides PONG_MODE)
    #[arg(short, long)]
    mode: Option<ServiceMode>,
}

impl Cli {
    /// Flag value for the environment variable it overrides.
    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "PONG_HTTP_HOST" => self.host.map(|h| h.to_string()),
            "PONG_HTTP_PORT" => self.port.map(|p| p.to_string()),
            "PONG_MODE" => self.mode.map(|m| m.to_string()),
            _ => None,
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            error!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = load_config_from(|name| cli.lookup(name).or_else(|| std::env::var(name).ok()))
        .context("Invalid configuration")?;

    info!("===========================================");
    info!("  Awala Pong Responder v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(mode = %config.mode, addr = %config.http_addr(), "Starting");

    let container = PongContainer::builder(config)
        .build()
        .context("Failed to build the pong service")?;

    container
        .run(shutdown_signal())
        .await
        .context("Pong responder failed")?;

    Ok(())
}
