//! CLI argument definitions using clap
//!
//! Commands:
//! - dynadown serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dynadown - LevelDB-style key-value store over a sorted table with blob attachments
#[derive(Parser, Debug)]
#[command(name = "dynadown")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the store and answer one JSON request per stdin line
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./dynadown.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
