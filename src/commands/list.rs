//! List command implementation.

use anyhow::{Context, Result};

use super::{collect, load_config, RunOptions};
use crate::sink::{export, CsvSink};
use crate::store::ListEntry;

/// Run the list command
pub async fn run(json: bool, options: &RunOptions) -> Result<()> {
    let config = load_config(options)?;
    let store = collect(&config, options).await?;

    if json {
        let entries: Vec<&ListEntry> = store.entries().collect();
        let out =
            serde_json::to_string_pretty(&entries).context("Failed to serialize entries")?;
        println!("{}", out);
    } else {
        export(&store, &CsvSink::stdout()).await?;
    }

    Ok(())
}
