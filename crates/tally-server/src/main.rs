//! Tally Server CLI
//!
//! Loads the TOML configuration and starts the HTTP server.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tally_server::{config::ServerConfig, init_tracing, start_server};

/// Financial data ingestion server
#[derive(Parser, Debug)]
#[command(name = "tally-server", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "TALLY_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ServerConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    init_tracing(config.log_level());

    start_server(config).await?;
    Ok(())
}
