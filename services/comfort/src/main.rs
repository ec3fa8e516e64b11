//! Comfort CLI
//!
//! Command-line entry point for the home comfort dashboard client.

use std::path::PathBuf;

use clap::Parser;
use comfort::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "comfort")]
#[command(about = "Home environmental-monitoring dashboard client")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file)
    #[arg(long)]
    server_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, server_url={:?}, log_level={:?}",
        args.config,
        args.server_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(server_url) = args.server_url {
        config.server.base_url = server_url;
    }

    tracing::info!("Starting comfort dashboard");
    tracing::debug!(
        "Weather every {:?}, refresh every {:?}",
        config.polling.weather_interval(),
        config.polling.refresh_interval()
    );

    comfort::run(config).await?;

    Ok(())
}
