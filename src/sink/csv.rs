//! CSV listing: `CIDR,VERSION,SOURCE,MATCHED_KEYWORD,NAME`, one row per entry.

use anyhow::Result;
use async_trait::async_trait;
use std::borrow::Cow;
use std::io::{Stdout, Write};
use std::sync::Mutex;

use super::{write_locked, Sink};
use crate::store::ListEntry;

/// RFC 4180 quoting, only when the field needs it
fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One CSV line for `entry`, without the line terminator.
pub fn render_row(entry: &ListEntry) -> String {
    let cidr = entry.cidr.to_string();
    let version = entry.version.to_string();
    [
        cidr.as_str(),
        version.as_str(),
        entry.source.as_str(),
        entry.matched_keyword.as_str(),
        entry.name.as_str(),
    ]
    .iter()
    .map(|field| quote(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Writes the listing, one row per entry
pub struct CsvSink<W> {
    out: Mutex<W>,
}

impl CsvSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> Sink for CsvSink<W> {
    async fn apply(&self, entries: &[&ListEntry]) -> Result<()> {
        let mut text = String::new();
        for entry in entries {
            text.push_str(&render_row(entry));
            text.push('\n');
        }
        write_locked(&self.out, &text)
    }
}
