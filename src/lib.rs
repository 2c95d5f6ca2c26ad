//! # Gremlins - blocklist of anti-piracy monitoring networks
//!
//! Collects the IP networks of anti-piracy monitoring organisations from
//! iBlockList bulk lists and the RIPE database, normalizes every range to
//! CIDR blocks and merges them into one duplicate-free list.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Gremlins                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: list, push, convert, config, version       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── Keywords, sources, HTTP limits, iptables chain       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Aggregator                                                 │
//! │    └── iBlockList then RIPE, failures isolated per source   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (Transport trait, reqwest + rustls)                │
//! │    ├── IblocklistSource (p2p lists, gzip)                   │
//! │    └── RipeSource (REST search, JSON)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Range (ipnet)             Keywords (NFKD)                  │
//! │    └── START-END to CIDR     └── Watch-list matching        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ListStore                                                  │
//! │    └── IPv4 / IPv6 partitions keyed by network              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Sink trait                                                 │
//! │    ├── CsvSink                                              │
//! │    └── IptablesSink (iptables-restore text)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use gremlins::aggregator::Aggregator;
//! use gremlins::config::Config;
//! use gremlins::fetcher::HttpTransport;
//! use gremlins::sink::{export, CsvSink};
//! use gremlins::store::ListStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("/etc/gremlins/config.yaml")?;
//!     let aggregator = Aggregator::new(&config, HttpTransport::new(&config.http)?);
//!
//!     let mut store = ListStore::new();
//!     let report = aggregator.aggregate(&mut store, true, true).await;
//!     eprint!("{}", report.render_summary());
//!
//!     export(&store, &CsvSink::stdout()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - Run orchestration and the run report
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error types
//! - [`fetcher`] - HTTP transport and the list sources
//! - [`keywords`] - Watch-list matching
//! - [`range`] - IPv4 range to CIDR conversion
//! - [`sink`] - CSV and firewall ruleset output
//! - [`store`] - Deduplicating network store
//! - [`utils`] - Common utility functions (formatting, truncation)

pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod keywords;
pub mod range;
pub mod sink;
pub mod store;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::GremlinsError;
