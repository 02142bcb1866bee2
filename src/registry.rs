//! Store registry
//!
//! Maps each datastore name to its backing file and its metadata record.
//! Entries are created on first access and live as long as the registry.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, XmldbError};
use crate::store::{SessionId, StoreName};
use crate::tree::ConfigTree;

/// Per-datastore metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreMeta {
    /// Session holding the exclusive lock
    pub lock_holder: Option<SessionId>,
    /// Content diverged from the committed baseline (candidate)
    pub modified: bool,
    /// Backing file was zero-length when loaded into cache
    pub empty_on_load: bool,
    /// Cached tree, exclusively owned by this entry
    pub cache: Option<ConfigTree>,
}

/// Registry of datastore metadata
#[derive(Debug, Default)]
pub struct StoreRegistry {
    dir: Option<PathBuf>,
    entries: HashMap<StoreName, StoreMeta>,
}

impl StoreRegistry {
    /// Create an empty registry over a datastore directory
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            entries: HashMap::new(),
        }
    }

    /// Backing file of a datastore: `<dir>/<name>_db`
    pub fn resolve(&self, name: StoreName) -> Result<PathBuf> {
        let dir = self
            .dir
            .as_ref()
            .ok_or_else(|| XmldbError::Config("dbdir not set".into()))?;
        Ok(dir.join(format!("{name}_db")))
    }

    /// Metadata of a datastore, if it has been referenced
    pub fn get(&self, name: StoreName) -> Option<&StoreMeta> {
        self.entries.get(&name)
    }

    /// Mutable metadata of a datastore, if it has been referenced
    pub fn get_mut(&mut self, name: StoreName) -> Option<&mut StoreMeta> {
        self.entries.get_mut(&name)
    }

    /// Metadata of a datastore, created empty on first access
    pub fn entry(&mut self, name: StoreName) -> &mut StoreMeta {
        self.entries.entry(name).or_default()
    }

    /// Replace the metadata record of a datastore
    pub fn set(&mut self, name: StoreName, meta: StoreMeta) {
        self.entries.insert(name, meta);
    }

    /// Names of every referenced datastore
    pub fn names(&self) -> Vec<StoreName> {
        let mut names: Vec<StoreName> = self.entries.keys().copied().collect();
        names.sort();
        names
    }

    /// Iterate over every entry mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (StoreName, &mut StoreMeta)> {
        self.entries.iter_mut().map(|(name, meta)| (*name, meta))
    }
}
