//! Command-line interface definition.

use crate::core::config::Profile;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pc-sentinel: forensic endpoint scanner
#[derive(Parser, Debug)]
#[command(name = "pc-sentinel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine processing
    Json,
}

/// Classifier strictness profile, CLI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfileArg {
    Strict,
    Loose,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Strict => Profile::Strict,
            ProfileArg::Loose => Profile::Loose,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full evidence scan
    Scan {
        /// Scan specific volume root(s) instead of every drive
        #[arg(short = 'p', long = "volume")]
        volume: Option<Vec<PathBuf>>,

        /// Classifier strictness profile
        #[arg(long)]
        profile: Option<ProfileArg>,

        /// Directory for the plain-text evidence reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip chunked delivery; only write local reports
        #[arg(long)]
        no_deliver: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show application information
    Info,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
