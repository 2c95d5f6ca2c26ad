//! Run orchestration: every enabled source, in a fixed order, against one store.

use chrono::{DateTime, Utc};
use colored::*;
use std::fmt::Write as _;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::fetcher::{IblocklistSource, RipeSource, Source, SourceStats, Transport};
use crate::keywords::KeywordMatcher;
use crate::store::{IpVersion, ListStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Every request answered
    Succeeded,
    /// Some requests failed, results of the others were kept
    Partial,
    /// No request answered
    Failed,
    /// Disabled for this run
    Skipped,
}

impl SourceStatus {
    fn from_stats(stats: &SourceStats) -> Self {
        if stats.failed_requests == 0 {
            Self::Succeeded
        } else if stats.failed_requests < stats.requests {
            Self::Partial
        } else {
            Self::Failed
        }
    }

    fn tag(self) -> ColoredString {
        match self {
            Self::Succeeded => "[OK]".green(),
            Self::Partial => "[PARTIAL]".yellow(),
            Self::Failed => "[NOK]".red(),
            Self::Skipped => "[SKIP]".dimmed(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub name: String,
    pub status: SourceStatus,
    pub stats: SourceStats,
}

/// Run start time as shown in the summary
const STARTED_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Result of one aggregation run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// In execution order
    pub sources: Vec<SourceOutcome>,
    pub ipv4_entries: usize,
    pub ipv6_entries: usize,
}

impl RunReport {
    pub fn total_entries(&self) -> usize {
        self.ipv4_entries + self.ipv6_entries
    }

    pub fn outcome(&self, name: &str) -> Option<&SourceOutcome> {
        self.sources.iter().find(|o| o.name == name)
    }

    /// True when at least one source ran and none of them got an answer
    pub fn all_failed(&self) -> bool {
        let mut ran = self
            .sources
            .iter()
            .filter(|o| o.status != SourceStatus::Skipped)
            .peekable();
        ran.peek().is_some() && ran.all(|o| o.status == SourceStatus::Failed)
    }

    /// Human readable summary, one line per source plus totals
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for outcome in &self.sources {
            let stats = &outcome.stats;
            let _ = write!(out, "{} {}", outcome.status.tag(), outcome.name);
            if outcome.status == SourceStatus::Skipped {
                out.push_str(": disabled\n");
                continue;
            }
            let _ = writeln!(
                out,
                ": {}/{} requests, {} added, {} duplicates, {} rejected, {} skipped",
                stats.requests - stats.failed_requests,
                stats.requests,
                stats.added,
                stats.duplicates,
                stats.rejected,
                stats.skipped
            );
            for err in &stats.errors {
                let _ = writeln!(out, "      {}", err);
            }
        }
        let _ = writeln!(
            out,
            "{} entries ({} IPv4, {} IPv6) in {:.1}s, started {}",
            self.total_entries(),
            self.ipv4_entries,
            self.ipv6_entries,
            self.elapsed.as_secs_f64(),
            self.started_at.format(STARTED_FORMAT)
        );
        out
    }
}

/// Runs the sources. Owns the transport; the store is passed in per run.
pub struct Aggregator<T: Transport> {
    transport: T,
    iblocklist: IblocklistSource,
    ripe: RipeSource,
}

impl<T: Transport> Aggregator<T> {
    pub fn new(config: &Config, transport: T) -> Self {
        let matcher = KeywordMatcher::new(&config.keywords);
        Self {
            transport,
            iblocklist: IblocklistSource::new(&config.iblocklist, matcher.clone()),
            ripe: RipeSource::new(&config.ripe, matcher),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Reset `store`, then fill it from iBlockList and RIPE, in that order.
    ///
    /// A source that fails does not stop the next one. Networks already
    /// listed by an earlier source are rejected, never overwritten.
    pub async fn aggregate(
        &self,
        store: &mut ListStore,
        use_iblocklist: bool,
        use_ripe: bool,
    ) -> RunReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        store.reset();

        let plan: [(&dyn Source, bool); 2] =
            [(&self.iblocklist, use_iblocklist), (&self.ripe, use_ripe)];

        let mut sources = Vec::with_capacity(plan.len());
        for (source, enabled) in plan {
            sources.push(self.run_source(source, enabled, store).await);
        }

        let report = RunReport {
            started_at,
            elapsed: clock.elapsed(),
            sources,
            ipv4_entries: store.len_of(IpVersion::V4),
            ipv6_entries: store.len_of(IpVersion::V6),
        };
        info!(
            "Aggregation done: {} IPv4 and {} IPv6 entries",
            report.ipv4_entries, report.ipv6_entries
        );
        report
    }

    async fn run_source(
        &self,
        source: &dyn Source,
        enabled: bool,
        store: &mut ListStore,
    ) -> SourceOutcome {
        let name = source.name().to_string();
        if !enabled {
            info!("{} disabled, skipping", name);
            return SourceOutcome {
                name,
                status: SourceStatus::Skipped,
                stats: SourceStats::default(),
            };
        }

        info!("Collecting from {}...", name);
        let stats = source.collect(&self.transport, store).await;
        let status = SourceStatus::from_stats(&stats);
        match status {
            SourceStatus::Failed => error!("{} failed: no request succeeded", name),
            SourceStatus::Partial => warn!(
                "{}: {} of {} requests failed",
                name, stats.failed_requests, stats.requests
            ),
            _ => info!("{}: {} entries added", name, stats.added),
        }

        SourceOutcome {
            name,
            status,
            stats,
        }
    }
}
