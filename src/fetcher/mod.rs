//! HTTP fetching and the list sources built on it.

mod iblocklist;
mod ripe;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use iblocklist::{parse_p2p, IblocklistSource, ParsedList};
pub use ripe::{parse_search, RipeSource};

use crate::config::HttpConfig;
use crate::error::GremlinsError;
use crate::store::{EntryMeta, ListStore, StoreError};
use crate::utils::format_bytes;

#[cfg(test)]
use mockall::automock;

/// Raw answer from a remote endpoint
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type without parameters, lowercased (`application/json`)
    pub fn mime(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Where source payloads come from. Injected so sources can be tested offline.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`. Non-success statuses are returned, not turned into errors.
    async fn get(&self, url: &str) -> Result<HttpResponse, GremlinsError>;
}

/// reqwest-backed transport with a bounded timeout and download size
pub struct HttpTransport {
    client: Client,
    max_size: usize,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, GremlinsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("gremlins/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GremlinsError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            max_size: config.max_download_size,
        })
    }
}

/// Compared as u64: a declared length may not fit in usize
fn ensure_within(len: u64, max: usize, what: &str) -> Result<(), GremlinsError> {
    let max = max as u64;
    if len > max {
        return Err(GremlinsError::Network(format!(
            "{} too large: {} (max: {})",
            what,
            format_bytes(len),
            format_bytes(max)
        )));
    }
    Ok(())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, GremlinsError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GremlinsError::Network(format!("{}: {}", url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_length) = response.content_length() {
            ensure_within(content_length, self.max_size, "Response")?;
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GremlinsError::Network(format!("Failed to read body of {}: {}", url, e)))?;

        // Content-Length may be absent or wrong
        ensure_within(body.len() as u64, self.max_size, "Downloaded content")?;

        Ok(HttpResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// A network found in a source, not yet in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub cidr: String,
    pub meta: EntryMeta,
}

/// What one source contributed during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub requests: usize,
    pub failed_requests: usize,
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
    /// Matching lines or objects that could not be turned into networks
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl SourceStats {
    /// Record a failed request and keep going
    pub(crate) fn request_failed(&mut self, what: &str, error: &GremlinsError) {
        warn!("Failed to fetch {}: {}", what, error);
        self.failed_requests += 1;
        self.errors.push(format!("{}: {}", what, error));
    }

    /// Submit candidates to the store, counting what happened to each
    pub(crate) fn submit_all(&mut self, store: &mut ListStore, candidates: Vec<Candidate>) {
        for candidate in candidates {
            self.submit(store, candidate);
        }
    }

    fn submit(&mut self, store: &mut ListStore, candidate: Candidate) {
        let source = candidate.meta.source.clone();
        match store.add(&candidate.cidr, candidate.meta) {
            Ok(()) => {
                debug!("Listed {} from {}", candidate.cidr, source);
                self.added += 1;
            }
            Err(StoreError::KeyAlreadyExists(key)) => {
                let owner = store
                    .get(&key)
                    .map(|e| e.source.as_str())
                    .unwrap_or("unknown");
                info!(
                    "Duplicate {} from {} rejected (already listed by {})",
                    key, source, owner
                );
                self.duplicates += 1;
            }
            Err(e) => {
                warn!("Skipping {} from {}: {}", candidate.cidr, source, e);
                self.rejected += 1;
            }
        }
    }
}

/// A provider of candidate networks
#[async_trait]
pub trait Source: Send + Sync {
    /// Short label used in logs and the run summary
    fn name(&self) -> &str;

    /// Fetch, filter and submit everything this source knows about.
    ///
    /// Failures are recorded in the returned stats; entries already added
    /// stay in the store.
    async fn collect(&self, transport: &dyn Transport, store: &mut ListStore) -> SourceStats;
}
