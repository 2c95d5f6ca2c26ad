//! RIPE database REST search.
//!
//! One query per keyword. `inetnum` objects carry an IPv4 range
//! (`A - B`), `inet6num` objects an IPv6 prefix that is already CIDR.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Candidate, ParsedList, Source, SourceStats, Transport};
use crate::config::RipeConfig;
use crate::error::GremlinsError;
use crate::keywords::KeywordMatcher;
use crate::range::range_to_cidrs;
use crate::store::{EntryMeta, ListStore};

/// Source identifier recorded on every RIPE entry
const SOURCE_ID: &str = "RIPE";

const INETNUM: &str = "inetnum";
const INET6NUM: &str = "inet6num";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    objects: Option<Objects>,
}

#[derive(Debug, Deserialize)]
struct Objects {
    #[serde(default)]
    object: Vec<WhoisObject>,
}

#[derive(Debug, Deserialize)]
struct WhoisObject {
    #[serde(rename = "type")]
    kind: String,
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    #[serde(default)]
    attribute: Vec<Attribute>,
}

#[derive(Debug, Deserialize)]
struct Attribute {
    name: String,
    #[serde(default)]
    value: String,
}

impl WhoisObject {
    fn first<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.all(name).next()
    }

    fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .attribute
            .iter()
            .filter(move |a| a.name == name)
            .map(|a| a.value.trim())
    }
}

/// Extract matching networks from a RIPE search response body.
pub fn parse_search(body: &str, matcher: &KeywordMatcher) -> Result<ParsedList, GremlinsError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| GremlinsError::Decode(format!("RIPE JSON: {}", e)))?;

    let mut parsed = ParsedList::default();
    let objects = response.objects.map(|o| o.object).unwrap_or_default();

    for object in &objects {
        if object.kind != INETNUM && object.kind != INET6NUM {
            continue;
        }

        let primary = match object.first(&object.kind) {
            Some(value) => value,
            None => {
                warn!("RIPE {} object without a value, skipping", object.kind);
                parsed.skipped += 1;
                continue;
            }
        };

        let netname = object.first("netname");
        let labels: Vec<&str> = netname.into_iter().chain(object.all("descr")).collect();
        let keyword = match matcher.find(&labels.join(" ")) {
            Some(keyword) => keyword,
            None => {
                debug!("RIPE {} {} matches no keyword", object.kind, primary);
                continue;
            }
        };
        let name = labels.first().copied().unwrap_or(primary);

        if object.kind == INET6NUM {
            parsed.candidates.push(Candidate {
                cidr: primary.to_string(),
                meta: EntryMeta::new(SOURCE_ID, keyword, name),
            });
            continue;
        }

        match range_to_cidrs(primary) {
            Ok(blocks) => {
                for block in blocks {
                    parsed.candidates.push(Candidate {
                        cidr: block.to_string(),
                        meta: EntryMeta::new(SOURCE_ID, keyword, name),
                    });
                }
            }
            Err(e) => {
                warn!("RIPE inetnum '{}': {}", primary, e);
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

/// Queries the RIPE database once per keyword
pub struct RipeSource {
    base_url: String,
    matcher: KeywordMatcher,
}

impl RipeSource {
    pub fn new(config: &RipeConfig, matcher: KeywordMatcher) -> Self {
        Self {
            base_url: config.base_url.clone(),
            matcher,
        }
    }

    /// Search URL for one keyword
    pub fn search_url(&self, keyword: &str) -> Result<String, GremlinsError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[("query-string", keyword), ("flags", "no-filtering")],
        )
        .map_err(|e| GremlinsError::Config(format!("Invalid RIPE URL: {}", e)))?;
        Ok(url.into())
    }

    /// `Ok(None)` when RIPE has no object for the keyword
    async fn search(
        &self,
        transport: &dyn Transport,
        keyword: &str,
    ) -> Result<Option<ParsedList>, GremlinsError> {
        let url = self.search_url(keyword)?;
        let response = transport.get(&url).await?;

        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(GremlinsError::HttpStatus {
                status: response.status,
                url,
            });
        }
        if response.mime().as_deref() != Some("application/json") {
            return Err(GremlinsError::UnexpectedContentType {
                content_type: response.mime().unwrap_or_else(|| "none".to_string()),
                url,
            });
        }

        let body = String::from_utf8_lossy(&response.body);
        parse_search(&body, &self.matcher).map(Some)
    }
}

#[async_trait]
impl Source for RipeSource {
    fn name(&self) -> &str {
        SOURCE_ID
    }

    async fn collect(&self, transport: &dyn Transport, store: &mut ListStore) -> SourceStats {
        let mut stats = SourceStats::default();

        for keyword in self.matcher.keywords() {
            stats.requests += 1;
            info!("Requesting RIPE for '{}'...", keyword);

            match self.search(transport, keyword).await {
                Ok(Some(parsed)) => {
                    info!(
                        "RIPE '{}' - {} matching networks",
                        keyword,
                        parsed.candidates.len()
                    );
                    stats.skipped += parsed.skipped;
                    stats.submit_all(store, parsed.candidates);
                }
                Ok(None) => info!("RIPE has no object for '{}'", keyword),
                Err(e) => stats.request_failed(&format!("RIPE '{}'", keyword), &e),
            }
        }

        stats
    }
}
