//! Store configuration via `memdb.toml`
//!
//! On first open, a default `memdb.toml` is written next to the data. To
//! change settings, edit the file and restart. The shared peer secret is
//! never read from this file; it is handed to the replicator directly.

use memdb_core::{DocumentLimits, Error, Result, MAX_DOCUMENT_SIZE, MAX_NESTING_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::search::tokenizer::DEFAULT_PHRASE_WORD_LIMIT;
use crate::search::{IndexOptions, SignificantTermsOptions};

/// Config file name placed in the base directory.
pub const CONFIG_FILE_NAME: &str = "memdb.toml";

/// Directory under the base directory holding document files, unless
/// `data_dir` says otherwise.
pub const DEFAULT_DATA_DIR: &str = ".memdb";

/// Search defaults, `[search]` in `memdb.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size when a search does not give one
    #[serde(default = "default_page_size")]
    pub default_size: usize,
}

fn default_page_size() -> usize {
    25
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
        }
    }
}

/// Store configuration loaded from `memdb.toml`.
///
/// # Example
///
/// ```toml
/// hostname = "http://10.0.0.1:9999"
/// peers = ["http://10.0.0.2:9999"]
///
/// [significant_terms]
/// threshold = 200.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Public base URL of this node, as peers address it
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Peers contacted at startup
    #[serde(default)]
    pub peers: Vec<String>,
    /// Where document files live; `<base>/.memdb` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Largest accepted document, in bytes
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,
    /// Deepest accepted object/array nesting
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
    /// Longest phrase, in words, indexed for `contains`
    #[serde(default = "default_phrase_word_limit")]
    pub phrase_word_limit: usize,
    /// Timeout of one peer call, in milliseconds
    #[serde(default = "default_peer_timeout_ms")]
    pub peer_timeout_ms: u64,
    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,
    /// Significant terms defaults
    #[serde(default)]
    pub significant_terms: SignificantTermsOptions,
}

fn default_hostname() -> String {
    "http://127.0.0.1:9999".to_string()
}

fn default_max_document_size() -> usize {
    MAX_DOCUMENT_SIZE
}

fn default_max_nesting_depth() -> usize {
    MAX_NESTING_DEPTH
}

fn default_phrase_word_limit() -> usize {
    DEFAULT_PHRASE_WORD_LIMIT
}

fn default_peer_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            peers: Vec::new(),
            data_dir: None,
            max_document_size: default_max_document_size(),
            max_nesting_depth: default_max_nesting_depth(),
            phrase_word_limit: default_phrase_word_limit(),
            peer_timeout_ms: default_peer_timeout_ms(),
            search: SearchConfig::default(),
            significant_terms: SignificantTermsOptions::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# memdb configuration
#
# Public base URL of this node, as other peers reach it.
hostname = "http://127.0.0.1:9999"

# Peers to join at startup (base URLs).
peers = []

# Directory holding one file per document (default: <base>/.memdb).
# data_dir = "/var/lib/memdb"

# Documents larger than this many bytes are rejected (default: 16 MiB).
max_document_size = 16777216

# Documents nested deeper than this are rejected.
max_nesting_depth = 100

# Longest phrase, in words, indexed for "contains" queries.
phrase_word_limit = 3

# Timeout of a single peer call, in milliseconds.
peer_timeout_ms = 5000

[search]
# Page size when a search does not specify one.
default_size = 25

[significant_terms]
# Both values are percentages.
#   threshold = minimum (result frequency / corpus frequency) * 100
#   minimum   = minimum share of result documents containing the term
threshold = 200.0
minimum = 33.34
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load `<base>/memdb.toml`, writing the default first if it is missing.
    pub fn load_or_create(base: &Path) -> Result<Self> {
        std::fs::create_dir_all(base).map_err(|e| {
            Error::config(format!(
                "Failed to create directory '{}': {}",
                base.display(),
                e
            ))
        })?;
        let path = base.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Reject values the store cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::config("hostname must not be empty"));
        }
        if self.phrase_word_limit == 0 {
            return Err(Error::config("phrase_word_limit must be at least 1"));
        }
        if self.max_nesting_depth == 0 || self.max_document_size == 0 {
            return Err(Error::config("document limits must be positive"));
        }
        if self.search.default_size == 0 {
            return Err(Error::config("search.default_size must be at least 1"));
        }
        let terms = &self.significant_terms;
        if !(terms.threshold >= 0.0 && terms.minimum >= 0.0) {
            return Err(Error::config(
                "significant_terms values must be non-negative percentages",
            ));
        }
        Ok(())
    }

    /// Storage directory for a store based at `base`.
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.join(DEFAULT_DATA_DIR),
        }
    }

    /// Indexing options derived from this config.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            limits: DocumentLimits {
                max_document_size: self.max_document_size,
                max_nesting_depth: self.max_nesting_depth,
            },
            phrase_word_limit: self.phrase_word_limit,
        }
    }

    /// Bound on a single peer call.
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}
