//! Alertmanager Load Harness - Main Entry Point

use clap::Parser;
use harness::{init_logging, run, Cli};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!("=== Alertmanager Load Harness v{} ===", env!("CARGO_PKG_VERSION"));

    run(cli).await?;

    Ok(())
}
