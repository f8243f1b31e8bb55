use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spotx")]
#[command(about = "Single-asset spot exchange with a central limit order book")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the exchange with the given configuration
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Log output format (pretty, json, compact)
        #[arg(long, default_value = "pretty")]
        log_format: String,
    },

    /// Validate a configuration file without starting the exchange
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
