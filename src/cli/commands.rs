//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the TradeTracker merchant web service
#[derive(Parser, Debug)]
#[command(name = "tap-tradetracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON), updated as bookmarks advance
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Catalog file (JSON) selecting streams
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the catalog of available streams
    Discover,

    /// Test the credentials against the web service
    Check,

    /// Sync selected streams to stdout
    Sync {
        /// Streams to sync (comma-separated, empty = catalog selection or all)
        #[arg(long)]
        streams: Option<String>,
    },
}

/// Split a comma-separated stream list, ignoring blanks
pub fn parse_stream_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
