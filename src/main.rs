//! tap-tradetracker CLI
//!
//! Command-line interface for the TradeTracker tap

use clap::Parser;
use tap_tradetracker::cli::{Cli, Runner};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the message stream
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        if e.is_remote() {
            error!("Remote call failed: {e}");
        } else {
            error!("{e}");
        }
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
