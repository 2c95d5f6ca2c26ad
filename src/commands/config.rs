//! Config command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Print the default configuration as YAML, or save it to `write`
pub fn run(write: Option<&Path>) -> Result<()> {
    match write {
        Some(path) => {
            Config::default().save(path)?;
            info!("Default configuration written to {}", path.display());
        }
        None => print!("{}", Config::generate_default_yaml()?),
    }
    Ok(())
}
