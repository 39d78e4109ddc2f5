//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use icsbridge_core::TracingOutputFormat;

/// icsbridge - Mirror an ICS feed into a Google Calendar
#[derive(Debug, Parser)]
#[command(name = "icsbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ICSBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "ICSBRIDGE_LOG_FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run sync cycles on the poll interval until interrupted
    Run {
        /// Print the cycle history as JSON on shutdown
        #[arg(long)]
        print_history: bool,
    },

    /// Run a single sync cycle and exit
    Sync {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
