//! Push command implementation.

use anyhow::Result;
use tracing::info;

use super::{collect, load_config, RunOptions};
use crate::sink::{create_sink, export, SinkTarget};

/// Run the push command
pub async fn run(target: SinkTarget, no_log: bool, options: &RunOptions) -> Result<()> {
    let config = load_config(options)?;

    // Unsupported targets fail before any download
    let sink = create_sink(target, &config, !no_log)?;

    let store = collect(&config, options).await?;
    let count = export(&store, sink.as_ref()).await?;
    info!("Pushed {} entries to {}", count, target);

    Ok(())
}
