//! Consumers of the aggregated list (CSV listing, firewall rulesets).

mod csv;
mod iptables;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use tracing::info;

pub use self::csv::{render_row, CsvSink};
pub use self::iptables::{render_ruleset, IptablesSink, LOG_PREFIX};

use crate::config::Config;
use crate::error::GremlinsError;
use crate::store::{ListEntry, ListStore};

/// Something the final entry set can be handed to
#[async_trait]
pub trait Sink: Send + Sync {
    /// Consume the entries, IPv4 first then IPv6, each ascending
    async fn apply(&self, entries: &[&ListEntry]) -> Result<()>;
}

/// Firewall targets accepted by `push`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkTarget {
    /// iptables-restore ruleset on stdout
    Iptables,
    /// Sophos UTM 9
    Utm9,
    /// Freebox OS
    Fbxos,
    Pfsense,
    Opnsense,
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Iptables => "iptables",
            Self::Utm9 => "utm9",
            Self::Fbxos => "fbxos",
            Self::Pfsense => "pfsense",
            Self::Opnsense => "opnsense",
        };
        f.write_str(name)
    }
}

/// Build the sink for `target`, writing to stdout.
///
/// Only iptables has an implementation. `log` overrides `iptables.log`
/// from the configuration when false.
pub fn create_sink(
    target: SinkTarget,
    config: &Config,
    log: bool,
) -> Result<Box<dyn Sink>, GremlinsError> {
    match target {
        SinkTarget::Iptables => Ok(Box::new(IptablesSink::new(
            std::io::stdout(),
            &config.iptables.chain,
            config.iptables.log && log,
        ))),
        other => Err(GremlinsError::SinkUnavailable(other.to_string())),
    }
}

/// Hand every entry of `store` to `sink`. Returns the number of entries.
pub async fn export(store: &ListStore, sink: &dyn Sink) -> Result<usize> {
    let entries: Vec<&ListEntry> = store.entries().collect();
    sink.apply(&entries).await?;
    info!("Exported {} entries", entries.len());
    Ok(entries.len())
}

/// Write and flush under the lock; sinks are shared behind `&self`
pub(crate) fn write_locked<W: Write>(out: &Mutex<W>, text: &str) -> Result<()> {
    let mut out = out.lock().map_err(|_| anyhow!("Output lock poisoned"))?;
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .context("Failed to write output")
}
