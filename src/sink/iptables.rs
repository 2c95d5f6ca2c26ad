//! iptables-restore ruleset rendering.
//!
//! Nothing is applied: the ruleset is written out for the operator to load
//! with `iptables-restore --noflush` (and `ip6tables-restore --noflush` for
//! the IPv6 part).

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Mutex;

use super::{write_locked, Sink};
use crate::store::{IpVersion, ListEntry};
use crate::utils::truncate;

pub const LOG_PREFIX: &str = "Gremlins-Blocked: ";

/// Built-in chains that jump into the dedicated chain
const HOOK_CHAINS: [&str; 2] = ["INPUT", "FORWARD"];

/// Header of each ruleset in the sink output
const RESTORE_HINT: &str = "# load with: iptables-restore --noflush\n";
const RESTORE_HINT_V6: &str = "# load with: ip6tables-restore --noflush\n";

/// iptables accepts up to 256 characters, keep rules readable
const MAX_COMMENT_LEN: usize = 64;

/// Comment text safe to put between double quotes
fn sanitize_comment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    truncate(cleaned.trim(), MAX_COMMENT_LEN)
}

/// Render the `*filter` table for the `version` entries of `entries`.
///
/// Meant for `iptables-restore --noflush`: a plain restore replaces every
/// chain of the filter table. With `--noflush` only the dedicated chain is
/// reset by its declaration, so an empty ruleset clears a previous run.
/// The INPUT and FORWARD jumps are inserted on every load, so a reload
/// after the first one duplicates them until they are deleted.
pub fn render_ruleset(
    entries: &[&ListEntry],
    version: IpVersion,
    chain: &str,
    log: bool,
) -> String {
    let mut out = String::from("*filter\n");
    let _ = writeln!(out, ":{} - [0:0]", chain);
    for hook in HOOK_CHAINS {
        let _ = writeln!(out, "-I {} -j {}", hook, chain);
    }

    for entry in entries.iter().filter(|e| e.version == version) {
        let comment = sanitize_comment(&entry.name);
        let matcher = if comment.is_empty() {
            format!("-A {} -s {}", chain, entry.cidr)
        } else {
            format!(
                "-A {} -s {} -m comment --comment \"{}\"",
                chain, entry.cidr, comment
            )
        };
        if log {
            let _ = writeln!(out, "{} -j LOG --log-prefix \"{}\"", matcher, LOG_PREFIX);
        }
        let _ = writeln!(out, "{} -j DROP", matcher);
    }

    out.push_str("COMMIT\n");
    out
}

/// Writes the IPv4 ruleset, then the IPv6 one when there are IPv6 entries
pub struct IptablesSink<W> {
    out: Mutex<W>,
    chain: String,
    log: bool,
}

impl<W: Write + Send> IptablesSink<W> {
    pub fn new(out: W, chain: &str, log: bool) -> Self {
        Self {
            out: Mutex::new(out),
            chain: chain.to_string(),
            log,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> Sink for IptablesSink<W> {
    async fn apply(&self, entries: &[&ListEntry]) -> Result<()> {
        let mut text = String::from(RESTORE_HINT);
        text.push_str(&render_ruleset(entries, IpVersion::V4, &self.chain, self.log));

        if entries.iter().any(|e| e.version == IpVersion::V6) {
            text.push_str(RESTORE_HINT_V6);
            text.push_str(&render_ruleset(entries, IpVersion::V6, &self.chain, self.log));
        }

        write_locked(&self.out, &text)
    }
}
