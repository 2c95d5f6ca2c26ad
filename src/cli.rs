//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::sink::SinkTarget;

#[derive(Parser)]
#[command(name = "gremlins")]
#[command(author, version, about = "Blocklist of anti-piracy monitoring networks")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults are used when it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Skip the iBlockList source
    #[arg(long, global = true)]
    pub disable_iblocklist: bool,

    /// Skip the RIPE database source
    #[arg(long, global = true)]
    pub disable_ripe: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate all sources and print the list as CSV
    List {
        /// Print a JSON array instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Aggregate all sources and hand the list to a firewall target
    Push {
        /// Firewall target
        #[arg(value_enum)]
        target: SinkTarget,

        /// Do not emit LOG rules
        #[arg(long)]
        no_log: bool,
    },

    /// Convert START-END IPv4 ranges to CIDR blocks
    Convert {
        /// Ranges such as 192.0.2.0-192.0.2.7
        #[arg(required = true)]
        ranges: Vec<String>,
    },

    /// Print the default configuration, or write it to a file
    Config {
        /// Write the configuration to this file instead of printing it
        #[arg(long, value_name = "PATH")]
        write: Option<PathBuf>,
    },

    /// Show version
    Version,
}
