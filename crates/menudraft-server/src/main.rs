//! menudraft server binary
//!
//! Starts the HTTP server for menu extraction jobs.

use anyhow::{Context, Result};
use clap::Parser;
use menudraft_server::{config::ServiceConfig, init_tracing, start_server};
use std::path::PathBuf;
use std::process;

/// Menu extraction service
#[derive(Parser)]
#[command(name = "menudraft-server")]
#[command(about = "Turn uploaded menus into structured drafts", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "MENUDRAFT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind port from the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using defaults and environment");
            eprintln!("Usage: menudraft-server --config <path-to-config.toml>");
            eprintln!();
            ServiceConfig::from_env().context("Failed to build config from environment")?
        }
    };

    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    start_server(config).await?;
    Ok(())
}
