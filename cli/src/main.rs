//! EcoCharge CLI server
//!
//! ```sh
//! # Run with default config (~/.config/ecocharge/config.toml)
//! ecocharge
//!
//! # Custom config path
//! ecocharge --config /etc/ecocharge/config.toml
//!
//! # Validate config without starting
//! ecocharge --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use ecocharge::config::AppConfig;
use ecocharge::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "ecocharge",
    version,
    about = "Booking and telemetry backend for EV charging stations",
    long_about = "EcoCharge: REST API, WebSocket push channels and the simulated \
                  telemetry job for EV charging stations.\n\n\
                  Default config: ~/.config/ecocharge/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ECOCHARGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Do not start the simulated telemetry job.
    #[arg(long)]
    no_telemetry: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ecocharge::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if cli.check => {
            eprintln!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!(path = %config_path.display(), error = %e, "Failed to load config");
            return Err(e.into());
        }
    };

    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.no_telemetry {
        config.telemetry.enabled = false;
    }

    if cli.check {
        config.validate()?;
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Database    : {}", config.database.connection_url());
        println!("   Telemetry   : {}", if config.telemetry.enabled { "on" } else { "off" });
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    info!(path = %config_path.display(), "Configuration loaded");

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
