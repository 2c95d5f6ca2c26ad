//! In-memory store of listed networks, keyed by CIDR block.
//!
//! The store holds one partition per IP version. A network can only be
//! listed once: whichever source submits it first owns the entry, later
//! submissions are rejected with [`StoreError::KeyAlreadyExists`]. This is
//! what keeps the exported list free of duplicates.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid CIDR IPv4 network format: {0}")]
    InvalidIpv4Network(String),

    #[error("Invalid CIDR IPv6 network format: {0}")]
    InvalidIpv6Network(String),

    #[error("Key already exists: {0}")]
    KeyAlreadyExists(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

impl StoreError {
    /// Malformed network text, as opposed to a key conflict.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIpv4Network(_) | Self::InvalidIpv6Network(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn number(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }
}

// Serialized as the bare version number, like the CSV column
impl Serialize for IpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Who listed a network and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryMeta {
    /// List name (`bt_level1`) or registry (`RIPE`)
    pub source: String,
    /// Watch-list term that triggered inclusion
    pub matched_keyword: String,
    /// Free-text label from the source, usually an organisation name
    pub name: String,
}

impl EntryMeta {
    pub fn new(
        source: impl Into<String>,
        matched_keyword: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            matched_keyword: matched_keyword.into(),
            name: name.into(),
        }
    }
}

/// One listed network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub cidr: IpNet,
    pub version: IpVersion,
    pub source: String,
    pub matched_keyword: String,
    pub name: String,
}

impl ListEntry {
    fn new(cidr: IpNet, meta: EntryMeta) -> Self {
        let version = match cidr {
            IpNet::V4(_) => IpVersion::V4,
            IpNet::V6(_) => IpVersion::V6,
        };
        Self {
            cidr,
            version,
            source: meta.source,
            matched_keyword: meta.matched_keyword,
            name: meta.name,
        }
    }
}

/// Parse a CIDR key, strictly: the address must be the network address.
///
/// Text containing `:` is treated as IPv6, anything else as IPv4, so the
/// error says which family failed validation.
fn parse_network(cidr: &str) -> Result<IpNet, StoreError> {
    let cidr = cidr.trim();
    if cidr.contains(':') {
        let net: Ipv6Net = cidr
            .parse()
            .map_err(|_| StoreError::InvalidIpv6Network(cidr.to_string()))?;
        if net.trunc() != net {
            return Err(StoreError::InvalidIpv6Network(cidr.to_string()));
        }
        Ok(IpNet::V6(net))
    } else {
        let net: Ipv4Net = cidr
            .parse()
            .map_err(|_| StoreError::InvalidIpv4Network(cidr.to_string()))?;
        if net.trunc() != net {
            return Err(StoreError::InvalidIpv4Network(cidr.to_string()));
        }
        Ok(IpNet::V4(net))
    }
}

/// Two ordered partitions, one per IP version.
///
/// Reads come back sorted by network address, then prefix length.
#[derive(Debug, Default)]
pub struct ListStore {
    ipv4: BTreeMap<IpNet, ListEntry>,
    ipv6: BTreeMap<IpNet, ListEntry>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, version: IpVersion) -> &BTreeMap<IpNet, ListEntry> {
        match version {
            IpVersion::V4 => &self.ipv4,
            IpVersion::V6 => &self.ipv6,
        }
    }

    fn partition_mut(&mut self, net: &IpNet) -> &mut BTreeMap<IpNet, ListEntry> {
        match net {
            IpNet::V4(_) => &mut self.ipv4,
            IpNet::V6(_) => &mut self.ipv6,
        }
    }

    /// Insert a new entry. Never overwrites an existing one.
    pub fn add(&mut self, cidr: &str, meta: EntryMeta) -> Result<(), StoreError> {
        let net = parse_network(cidr)?;
        let partition = self.partition_mut(&net);
        if partition.contains_key(&net) {
            return Err(StoreError::KeyAlreadyExists(net.to_string()));
        }
        partition.insert(net, ListEntry::new(net, meta));
        Ok(())
    }

    /// Replace the metadata of an existing entry.
    pub fn update(&mut self, cidr: &str, meta: EntryMeta) -> Result<(), StoreError> {
        let net = parse_network(cidr)?;
        match self.partition_mut(&net).get_mut(&net) {
            Some(entry) => {
                *entry = ListEntry::new(net, meta);
                Ok(())
            }
            None => Err(StoreError::KeyNotFound(net.to_string())),
        }
    }

    /// Remove an entry by its CIDR key.
    pub fn delete(&mut self, cidr: &str) -> Result<ListEntry, StoreError> {
        let net = parse_network(cidr)?;
        self.partition_mut(&net)
            .remove(&net)
            .ok_or_else(|| StoreError::KeyNotFound(net.to_string()))
    }

    /// Look up one entry. Malformed keys simply find nothing.
    pub fn get(&self, cidr: &str) -> Option<&ListEntry> {
        let net = parse_network(cidr).ok()?;
        match net {
            IpNet::V4(_) => self.ipv4.get(&net),
            IpNet::V6(_) => self.ipv6.get(&net),
        }
    }

    /// Read-only view of one partition, ascending by network.
    pub fn get_all(&self, version: IpVersion) -> &BTreeMap<IpNet, ListEntry> {
        self.partition(version)
    }

    /// Every entry, IPv4 partition first.
    pub fn entries(&self) -> impl Iterator<Item = &ListEntry> {
        self.ipv4.values().chain(self.ipv6.values())
    }

    pub fn len_of(&self, version: IpVersion) -> usize {
        self.partition(version).len()
    }

    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    /// Drop every entry from both partitions.
    pub fn reset(&mut self) {
        self.ipv4.clear();
        self.ipv6.clear();
    }
}

impl fmt::Display for ListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ListStore: {} IPv4 entries, {} IPv6 entries",
            self.ipv4.len(),
            self.ipv6.len()
        )
    }
}
