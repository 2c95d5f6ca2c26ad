//! CLI command implementations.

pub mod config;
pub mod convert;
pub mod list;
pub mod push;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::fetcher::HttpTransport;
use crate::store::ListStore;

/// Global options shared by the commands that aggregate
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub disable_iblocklist: bool,
    pub disable_ripe: bool,
    /// Suppress the end-of-run summary
    pub quiet: bool,
}

pub(crate) fn load_config(options: &RunOptions) -> Result<Config> {
    let config = Config::load_or_default(&options.config_path)
        .with_context(|| format!("Failed to load config from {:?}", options.config_path))?;
    debug!("Loaded config with {} keywords", config.keywords.len());
    Ok(config)
}

/// Run every enabled source into a fresh store and print the summary.
///
/// Fails only when all enabled sources failed.
pub(crate) async fn collect(config: &Config, options: &RunOptions) -> Result<ListStore> {
    let transport = HttpTransport::new(&config.http)?;
    let aggregator = Aggregator::new(config, transport);

    let use_iblocklist = config.iblocklist.enabled && !options.disable_iblocklist;
    let use_ripe = config.ripe.enabled && !options.disable_ripe;

    let mut store = ListStore::new();
    let report = aggregator
        .aggregate(&mut store, use_iblocklist, use_ripe)
        .await;

    if !options.quiet {
        eprintln!();
        eprint!("{}", report.render_summary());
    }

    if report.all_failed() {
        anyhow::bail!("No source could be fetched");
    }

    Ok(store)
}
