//! Gremlins - blocklist of anti-piracy monitoring networks.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gremlins::cli::{Cli, Commands};
use gremlins::commands::{self, RunOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // stdout carries the list, logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    let options = RunOptions {
        config_path: cli.config.clone(),
        disable_iblocklist: cli.disable_iblocklist,
        disable_ripe: cli.disable_ripe,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::List { json } => commands::list::run(json, &options).await,
        Commands::Push { target, no_log } => commands::push::run(target, no_log, &options).await,
        Commands::Convert { ranges } => commands::convert::run(&ranges),
        Commands::Config { write } => commands::config::run(write.as_deref()),
        Commands::Version => {
            println!("gremlins {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
