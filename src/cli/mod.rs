//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `discover` - Print the stream catalog
//! - `check` - Authenticate against the web service
//! - `sync` - Extract selected streams as Singer messages

mod commands;
mod runner;

pub use commands::{parse_stream_list, Cli, Commands};
pub use runner::Runner;

#[cfg(test)]
mod tests;
