//! IPv4 address range to CIDR conversion.
//!
//! Sources publish ranges as `START-END` pairs (iBlockList p2p lines,
//! RIPE `inetnum` values). Firewalls want CIDR blocks, so every range is
//! turned into the smallest ordered set of aligned blocks covering exactly
//! the same addresses.

use ipnet::{Ipv4Net, Ipv4Subnets};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use thiserror::Error;

/// Why a textual range could not be converted.
///
/// `InvalidAddress` is an address-format problem, `Reversed` a value problem,
/// `MissingSeparator` and `NotIpv4` a shape/type problem. All of them describe
/// bad input: callers skip the offending line and keep going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Malformed range '{0}': expected START-END")]
    MissingSeparator(String),

    #[error("Invalid IPv4 address '{0}'")]
    InvalidAddress(String),

    #[error("Not an IPv4 address '{0}'")]
    NotIpv4(String),

    #[error("Reversed range: {start} is greater than {end}")]
    Reversed { start: Ipv4Addr, end: Ipv4Addr },
}

/// Inclusive IPv4 address interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl Ipv4Range {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, RangeError> {
        if u32::from(start) > u32::from(end) {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of addresses in the range (1 ..= 2^32).
    pub fn len(&self) -> u64 {
        u64::from(u32::from(self.end)) - u64::from(u32::from(self.start)) + 1
    }

    /// A range always holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Minimal CIDR cover of the range, ordered by starting address.
    ///
    /// Greedy: from the current lower bound take the largest aligned block
    /// that does not run past `end`, then continue right after it.
    pub fn to_cidrs(&self) -> Vec<Ipv4Net> {
        Ipv4Subnets::new(self.start, self.end, 0).collect()
    }
}

impl FromStr for Ipv4Range {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| RangeError::MissingSeparator(s.to_string()))?;
        Self::new(parse_endpoint(start)?, parse_endpoint(end)?)
    }
}

impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn parse_endpoint(raw: &str) -> Result<Ipv4Addr, RangeError> {
    let trimmed = raw.trim();
    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => Ok(addr),
        Ok(IpAddr::V6(_)) => Err(RangeError::NotIpv4(trimmed.to_string())),
        Err(_) => Err(RangeError::InvalidAddress(trimmed.to_string())),
    }
}

/// Convert a textual `A-B` range into its minimal ordered CIDR blocks.
///
/// # Examples
/// ```
/// use gremlins::range::range_to_cidrs;
/// let blocks = range_to_cidrs("192.0.2.0-192.0.2.7").unwrap();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].to_string(), "192.0.2.0/29");
/// assert!(range_to_cidrs("192.0.2.7-192.0.2.0").is_err());
/// ```
pub fn range_to_cidrs(range: &str) -> Result<Vec<Ipv4Net>, RangeError> {
    Ok(range.parse::<Ipv4Range>()?.to_cidrs())
}
