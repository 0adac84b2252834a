//! pulse threshold trading bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Threshold trading bot with a live dashboard feed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PULSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pulse_telemetry::init_logging()?;

    info!("Starting pulse bot v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("PULSE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = if std::path::Path::new(&config_path).exists() {
        pulse_bot::AppConfig::from_file(&config_path)?
    } else {
        tracing::warn!(path = %config_path, "Config file not found, using defaults");
        pulse_bot::AppConfig::default()
    };

    pulse_bot::Application::new(config).run().await?;

    Ok(())
}
