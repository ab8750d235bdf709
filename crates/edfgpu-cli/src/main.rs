//! edfgpu CLI
//!
//! Dry-runs the EDF and GPU-aware plugins against a cluster fixture.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// edfgpu - deadline-aware, GPU-aware scheduling simulator
#[derive(Parser, Debug)]
#[command(name = "edfgpu")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Plugin configuration file (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overriding the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Admit, order and place every pending item in a cluster fixture
    Simulate {
        /// Cluster fixture (JSON)
        #[arg(long)]
        cluster: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and print the effective values
    CheckConfig,
}

fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, &config.logging.format)?;
    info!("Starting edfgpu v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Simulate { cluster, json } => {
            commands::simulate(&config, &cluster, json).await?;
        }
        Commands::CheckConfig => {
            commands::check_config(&config)?;
        }
    }

    Ok(())
}
