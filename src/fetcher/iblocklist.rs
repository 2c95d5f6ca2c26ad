//! iBlockList bulk lists in p2p format.
//!
//! Each list is a (usually gzipped) text file of `NAME:START-END` lines.

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::Url;
use std::io::Read;
use tracing::{info, warn};

use super::{Candidate, HttpResponse, Source, SourceStats, Transport};
use crate::config::IblocklistConfig;
use crate::error::GremlinsError;
use crate::keywords::KeywordMatcher;
use crate::range::range_to_cidrs;
use crate::store::{EntryMeta, ListStore};

const FILE_FORMAT: &str = "p2p";
const ARCHIVE_FORMAT: &str = "gz";

/// Separator between the label and the range; labels may contain it too
const P2P_SEPARATOR: char = ':';

/// Matching networks found in one list
#[derive(Debug, Default)]
pub struct ParsedList {
    pub candidates: Vec<Candidate>,
    pub skipped: usize,
}

/// Extract networks from a p2p list whose label or line matches a keyword.
///
/// The first `header_lines` lines are dropped, blank and `#` lines ignored.
/// Lines that match but cannot be parsed are logged and counted, never fatal.
pub fn parse_p2p(
    content: &str,
    list: &str,
    header_lines: usize,
    matcher: &KeywordMatcher,
) -> ParsedList {
    let mut parsed = ParsedList::default();

    for (index, line) in content.lines().enumerate().skip(header_lines) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let keyword = match matcher.find(line) {
            Some(keyword) => keyword,
            None => continue,
        };

        let (name, range) = match line.rsplit_once(P2P_SEPARATOR) {
            Some(parts) => parts,
            None => {
                warn!("{} line {}: no range in '{}'", list, index + 1, line);
                parsed.skipped += 1;
                continue;
            }
        };

        match range_to_cidrs(range) {
            Ok(blocks) => {
                for block in blocks {
                    parsed.candidates.push(Candidate {
                        cidr: block.to_string(),
                        meta: EntryMeta::new(list, keyword, name.trim()),
                    });
                }
            }
            Err(e) => {
                warn!("{} line {}: {}", list, index + 1, e);
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// Turn a list download into text according to its content type
fn decode_payload(response: &HttpResponse, url: &str) -> Result<String, GremlinsError> {
    match response.mime().as_deref() {
        Some("application/x-gzip") | Some("application/gzip") => gunzip(&response.body),
        Some(mime) if mime.starts_with("text/") => {
            Ok(String::from_utf8_lossy(&response.body).into_owned())
        }
        other => Err(GremlinsError::UnexpectedContentType {
            content_type: other.unwrap_or("none").to_string(),
            url: url.to_string(),
        }),
    }
}

fn gunzip(bytes: &[u8]) -> Result<String, GremlinsError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| GremlinsError::Decode(format!("gzip: {}", e)))?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Downloads every configured list and keeps the keyword matches
pub struct IblocklistSource {
    base_url: String,
    lists: Vec<String>,
    header_lines: usize,
    matcher: KeywordMatcher,
}

impl IblocklistSource {
    pub fn new(config: &IblocklistConfig, matcher: KeywordMatcher) -> Self {
        Self {
            base_url: config.base_url.clone(),
            lists: config.lists.clone(),
            header_lines: config.header_lines,
            matcher,
        }
    }

    /// Download URL of one list
    pub fn list_url(&self, list: &str) -> Result<String, GremlinsError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("list", list),
                ("fileformat", FILE_FORMAT),
                ("archiveformat", ARCHIVE_FORMAT),
            ],
        )
        .map_err(|e| GremlinsError::Config(format!("Invalid iBlockList URL: {}", e)))?;
        Ok(url.into())
    }

    async fn fetch_list(
        &self,
        transport: &dyn Transport,
        list: &str,
    ) -> Result<String, GremlinsError> {
        let url = self.list_url(list)?;
        let response = transport.get(&url).await?;
        if !response.is_success() {
            return Err(GremlinsError::HttpStatus {
                status: response.status,
                url,
            });
        }
        decode_payload(&response, &url)
    }
}

#[async_trait]
impl Source for IblocklistSource {
    fn name(&self) -> &str {
        "iBlockList"
    }

    async fn collect(&self, transport: &dyn Transport, store: &mut ListStore) -> SourceStats {
        let mut stats = SourceStats::default();

        for list in &self.lists {
            stats.requests += 1;
            info!("Fetching iBlockList list '{}'...", list);

            match self.fetch_list(transport, list).await {
                Ok(content) => {
                    let parsed = parse_p2p(&content, list, self.header_lines, &self.matcher);
                    info!(
                        "Parsed '{}' - {} matching networks",
                        list,
                        parsed.candidates.len()
                    );
                    stats.skipped += parsed.skipped;
                    stats.submit_all(store, parsed.candidates);
                }
                Err(e) => stats.request_failed(list, &e),
            }
        }

        stats
    }
}
