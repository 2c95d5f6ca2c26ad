//! End-to-end tests of the library: canned payloads in, CSV and rulesets out.

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::sync::Mutex;

use gremlins::aggregator::{Aggregator, SourceStatus};
use gremlins::config::Config;
use gremlins::error::GremlinsError;
use gremlins::fetcher::{HttpResponse, Transport};
use gremlins::sink::{export, render_row, CsvSink, IptablesSink};
use gremlins::store::{IpVersion, ListStore};

const BT_LEVEL1: &str = "\
# List distributed by iBlockList
# Do not edit
Trident Media Guard:198.51.100.0-198.51.100.255
Example Hosting:203.0.113.0-203.0.113.255
HADOPI:192.0.2.0-192.0.2.7
";

const RIPE_TMG: &str = r#"{"objects":{"object":[
  {"type":"inetnum","attributes":{"attribute":[
    {"name":"inetnum","value":"198.51.100.0 - 198.51.100.255"},
    {"name":"netname","value":"TMG-NET"}]}},
  {"type":"inet6num","attributes":{"attribute":[
    {"name":"inet6num","value":"2001:db8::/32"},
    {"name":"netname","value":"TMG-V6"}]}}
]}}"#;

/// Answers from a fixed table of URL fragments, records every request
struct CannedTransport {
    routes: Vec<(&'static str, HttpResponse)>,
    requested: Mutex<Vec<String>>,
}

impl CannedTransport {
    fn new(routes: Vec<(&'static str, HttpResponse)>) -> Self {
        Self {
            routes,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, GremlinsError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| GremlinsError::Network(format!("no route for {}", url)))
    }
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn gz_response(text: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        content_type: Some("application/x-gzip".to_string()),
        body: gzip(text),
    }
}

fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some("application/json;charset=UTF-8".to_string()),
        body: body.as_bytes().to_vec(),
    }
}

fn config() -> Config {
    let mut config = Config {
        keywords: vec![
            "hadopi".to_string(),
            "tmg".to_string(),
            "trident media guard".to_string(),
        ],
        ..Default::default()
    };
    config.iblocklist.lists = vec!["bt_level1".to_string(), "bt_level2".to_string()];
    config
}

fn transport() -> CannedTransport {
    CannedTransport::new(vec![
        ("list=bt_level1", gz_response(BT_LEVEL1)),
        ("list=bt_level2", gz_response("header\nheader\n")),
        ("query-string=tmg", json_response(200, RIPE_TMG)),
        ("query-string=hadopi", json_response(404, "{}")),
        ("query-string=trident", json_response(404, "{}")),
    ])
}

#[tokio::test]
async fn test_full_run_to_csv() {
    let config = config();
    let aggregator = Aggregator::new(&config, transport());
    let mut store = ListStore::new();
    let report = aggregator.aggregate(&mut store, true, true).await;

    assert!(report
        .sources
        .iter()
        .all(|o| o.status == SourceStatus::Succeeded));
    assert_eq!(report.ipv4_entries, 2);
    assert_eq!(report.ipv6_entries, 1);

    let sink = CsvSink::new(Vec::new());
    assert_eq!(export(&store, &sink).await.unwrap(), 3);
    let csv = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        csv,
        "192.0.2.0/29,4,bt_level1,hadopi,HADOPI\n\
         198.51.100.0/24,4,bt_level1,trident media guard,Trident Media Guard\n\
         2001:db8::/32,6,RIPE,tmg,TMG-V6\n"
    );
}

#[tokio::test]
async fn test_cross_source_duplicate_is_rejected() {
    let config = config();
    let aggregator = Aggregator::new(&config, transport());
    let mut store = ListStore::new();
    let report = aggregator.aggregate(&mut store, true, true).await;

    let entry = store.get("198.51.100.0/24").unwrap();
    assert_eq!(entry.source, "bt_level1");
    assert_eq!(report.outcome("RIPE").unwrap().stats.duplicates, 1);
}

#[tokio::test]
async fn test_ripe_only_run() {
    let config = config();
    let aggregator = Aggregator::new(&config, transport());
    let mut store = ListStore::new();
    let report = aggregator.aggregate(&mut store, false, true).await;

    assert_eq!(
        report.outcome("iBlockList").unwrap().status,
        SourceStatus::Skipped
    );
    assert_eq!(store.get("198.51.100.0/24").unwrap().source, "RIPE");
    assert_eq!(store.len_of(IpVersion::V6), 1);
}

#[tokio::test]
async fn test_requests_follow_configuration() {
    let config = config();
    let aggregator = Aggregator::new(&config, transport());
    let mut store = ListStore::new();
    aggregator.aggregate(&mut store, true, true).await;

    let requested = aggregator.transport().requested.lock().unwrap().clone();
    assert_eq!(requested.len(), 5);
    assert!(requested[0].contains("list=bt_level1"));
    assert!(requested[1].contains("list=bt_level2"));
    assert!(requested[2].contains("query-string=hadopi"));
    assert!(requested[4].contains("flags=no-filtering"));
}

#[tokio::test]
async fn test_unreachable_source_keeps_other_results() {
    let config = config();
    let transport = CannedTransport::new(vec![
        ("list=bt_level1", gz_response(BT_LEVEL1)),
        ("query-string=tmg", json_response(200, RIPE_TMG)),
    ]);
    let aggregator = Aggregator::new(&config, transport);
    let mut store = ListStore::new();
    let report = aggregator.aggregate(&mut store, true, true).await;

    assert_eq!(
        report.outcome("iBlockList").unwrap().status,
        SourceStatus::Partial
    );
    assert_eq!(report.outcome("RIPE").unwrap().status, SourceStatus::Partial);
    assert_eq!(report.total_entries(), 3);
    assert!(!report.all_failed());
}

#[tokio::test]
async fn test_iptables_output() {
    let config = config();
    let aggregator = Aggregator::new(&config, transport());
    let mut store = ListStore::new();
    aggregator.aggregate(&mut store, true, true).await;

    let sink = IptablesSink::new(Vec::new(), "GREMLINS", false);
    export(&store, &sink).await.unwrap();
    let rules = String::from_utf8(sink.into_inner()).unwrap();

    assert!(rules.contains("-A GREMLINS -s 192.0.2.0/29 -m comment --comment \"HADOPI\" -j DROP"));
    assert!(rules.contains("-A GREMLINS -s 2001:db8::/32 -m comment --comment \"TMG-V6\" -j DROP"));
    assert_eq!(rules.matches("COMMIT").count(), 2);
    // Both rulesets hook the chain into the built-in chains
    assert_eq!(rules.matches("-I INPUT -j GREMLINS\n").count(), 2);
    assert_eq!(rules.matches("-I FORWARD -j GREMLINS\n").count(), 2);
}

#[test]
fn test_untouched_store_has_empty_ipv6_partition() {
    let store = ListStore::new();
    assert!(store.get_all(IpVersion::V6).is_empty());
    assert_eq!(store.entries().map(render_row).count(), 0);
}
