//! Configuration management for Gremlins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gremlins/config.yaml";

/// Upper bound for the HTTP timeout, in seconds
const MAX_TIMEOUT_SECS: u64 = 600;

/// iptables limits chain names to 28 characters
const MAX_CHAIN_LEN: usize = 28;

fn is_valid_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// List and chain names end up in URLs and firewall rules
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_".contains(c))
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watch-list terms searched in every source
    pub keywords: Vec<String>,

    /// iBlockList bulk lists
    pub iblocklist: IblocklistConfig,

    /// RIPE database search
    pub ripe: RipeConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    /// iptables ruleset rendering
    pub iptables: IptablesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            iblocklist: IblocklistConfig::default(),
            ripe: RipeConfig::default(),
            http: HttpConfig::default(),
            iptables: IptablesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.keywords.iter().any(|k| !k.trim().is_empty()) {
            anyhow::bail!("At least one non-empty keyword is required");
        }

        if !is_valid_url(&self.iblocklist.base_url) {
            anyhow::bail!(
                "iBlockList base_url must use http or https: {}",
                self.iblocklist.base_url
            );
        }

        for list in &self.iblocklist.lists {
            if !is_valid_name(list) {
                anyhow::bail!(
                    "Invalid iBlockList list name '{}'. Use letters, digits, '-' or '_'",
                    list
                );
            }
        }

        if !is_valid_url(&self.ripe.base_url) {
            anyhow::bail!(
                "RIPE base_url must use http or https: {}",
                self.ripe.base_url
            );
        }

        if self.http.timeout_secs == 0 || self.http.timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!(
                "Invalid http.timeout_secs {}. Must be between 1 and {}",
                self.http.timeout_secs,
                MAX_TIMEOUT_SECS
            );
        }

        if self.http.max_download_size == 0 {
            anyhow::bail!("http.max_download_size must be greater than zero");
        }

        if !is_valid_name(&self.iptables.chain) || self.iptables.chain.len() > MAX_CHAIN_LEN {
            anyhow::bail!(
                "Invalid iptables chain '{}'. Use up to {} letters, digits, '-' or '_'",
                self.iptables.chain,
                MAX_CHAIN_LEN
            );
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("Failed to create directory: {:?}", parent_dir))?;
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Default configuration rendered as YAML
    pub fn generate_default_yaml() -> Result<String> {
        serde_yaml::to_string(&Self::default()).context("Failed to serialize default config")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IblocklistConfig {
    pub enabled: bool,
    /// Download endpoint; list name and formats are passed as query parameters
    pub base_url: String,
    pub lists: Vec<String>,
    /// Leading lines of each list that are not data
    pub header_lines: usize,
}

impl Default for IblocklistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://list.iblocklist.com/index.php".to_string(),
            lists: vec!["bt_level1".to_string(), "bt_level2".to_string()],
            header_lines: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RipeConfig {
    pub enabled: bool,
    /// REST search endpoint returning JSON
    pub base_url: String,
}

impl Default for RipeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://rest.db.ripe.net/search.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Maximum size of a single download, in bytes
    pub max_download_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_download_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IptablesConfig {
    pub chain: String,
    /// Emit a LOG rule before each DROP
    pub log: bool,
}

impl Default for IptablesConfig {
    fn default() -> Self {
        Self {
            chain: "GREMLINS".to_string(),
            log: true,
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "hadopi",
        "tmg",
        "trident mediguard",
        "trident mediaguard",
        "trident medi guard",
        "trident media guard",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}
