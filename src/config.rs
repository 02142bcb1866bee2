//! Datastore configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, XmldbError};

/// How the engine keeps parsed trees in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CacheMode {
    /// Keep one parsed tree per store
    #[default]
    #[serde(rename = "cache")]
    Cache,
    /// As `Cache`; readers borrow the cached tree instead of copying it
    #[serde(rename = "cache-zerocopy")]
    CacheZeroCopy,
    /// Never cache, every access goes to the backing file
    #[serde(rename = "nocache")]
    NoCache,
}

impl CacheMode {
    /// Whether trees are held in memory at all
    pub fn is_enabled(self) -> bool {
        self != CacheMode::NoCache
    }
}

/// Configuration for a datastore engine
///
/// ```
/// use rust_xmldb::{CacheMode, DatastoreConfig};
///
/// let config = DatastoreConfig::from_json_str(r#"{"xmldb-dir": "/var/db", "cache": "nocache"}"#).unwrap();
/// assert_eq!(config.cache, CacheMode::NoCache);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DatastoreConfig {
    /// Directory holding the `<name>_db` files
    #[serde(rename = "xmldb-dir", default)]
    pub dir: Option<PathBuf>,

    /// Cache mode
    #[serde(default)]
    pub cache: CacheMode,
}

impl DatastoreConfig {
    /// Creates a configuration with no directory and caching enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| XmldbError::io("read", path, e))?;
        Self::from_json_str(&content)
    }

    /// Sets the datastore directory.
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Sets the cache mode.
    #[must_use]
    pub const fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }
}
