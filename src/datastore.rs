//! Datastore engine handle
//!
//! [`Datastore`] owns the store registry and every cached tree. All
//! operations go through it by symbolic name; the lock, lifecycle, copy and
//! rename operations live in their own modules as further `impl` blocks.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::config::{CacheMode, DatastoreConfig};
use crate::error::{Result, XmldbError};
use crate::lifecycle::open_store_file;
use crate::registry::StoreRegistry;
use crate::store::{SessionId, StoreName};
use crate::tree::{ConfigTree, TOP_NAME};

/// Datastore shared between request threads
pub type SharedDatastore = Arc<Mutex<Datastore>>;

/// Configuration datastore engine
#[derive(Debug)]
pub struct Datastore {
    cache_mode: CacheMode,
    pub(crate) registry: StoreRegistry,
}

/// Snapshot of one datastore's metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStatus {
    /// Datastore name
    pub name: StoreName,
    /// Lock holder, if any
    pub session: Option<SessionId>,
    /// Whether a tree is cached
    pub cached: bool,
    /// Modified flag
    pub modified: bool,
    /// Empty-on-load flag
    pub empty: bool,
}

impl Datastore {
    /// Connect a datastore engine to its configuration
    pub fn connect(config: DatastoreConfig) -> Self {
        debug!(dir = ?config.dir, cache = ?config.cache, "xmldb connect");
        Self {
            cache_mode: config.cache,
            registry: StoreRegistry::new(config.dir),
        }
    }

    /// Wrap the engine for use behind a lock from several threads
    pub fn into_shared(self) -> SharedDatastore {
        Arc::new(Mutex::new(self))
    }

    /// Active cache mode
    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    /// The underlying store registry
    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// Release every cached tree. Metadata and locks are kept.
    pub fn disconnect(&mut self) {
        for (name, meta) in self.registry.iter_mut() {
            if meta.cache.take().is_some() {
                debug!(store = %name, "released cached tree");
            }
        }
    }

    /// Cached tree of a datastore. Never loads from disk.
    pub fn cache_get(&self, name: StoreName) -> Option<&ConfigTree> {
        self.registry.get(name)?.cache.as_ref()
    }

    /// Mutable borrow of a cached tree, for the write path
    pub fn cache_get_mut(&mut self, name: StoreName) -> Option<&mut ConfigTree> {
        self.registry.get_mut(name)?.cache.as_mut()
    }

    /// Install a tree as the cache of a datastore, releasing the previous one.
    /// Ignored when caching is disabled.
    pub fn cache_set(&mut self, name: StoreName, tree: ConfigTree) {
        if !self.cache_mode.is_enabled() {
            return;
        }
        self.registry.entry(name).cache = Some(tree);
    }

    /// Release the cached tree of a datastore. The backing file is untouched.
    pub fn clear(&mut self, name: StoreName) {
        if let Some(meta) = self.registry.get_mut(name) {
            meta.cache = None;
        }
    }

    /// Get modified flag. Only meaningful for candidate.
    pub fn modified_get(&self, name: StoreName) -> Result<bool> {
        self.registry
            .get(name)
            .map(|meta| meta.modified)
            .ok_or(XmldbError::NotFound(name))
    }

    /// Set modified flag
    pub fn modified_set(&mut self, name: StoreName, value: bool) -> Result<()> {
        let meta = self
            .registry
            .get_mut(name)
            .ok_or(XmldbError::NotFound(name))?;
        meta.modified = value;
        Ok(())
    }

    /// Get empty flag: the backing file was empty when loaded
    pub fn empty_get(&self, name: StoreName) -> Result<bool> {
        self.registry
            .get(name)
            .map(|meta| meta.empty_on_load)
            .ok_or(XmldbError::NotFound(name))
    }

    /// Set empty flag
    pub fn empty_set(&mut self, name: StoreName, value: bool) -> Result<()> {
        let meta = self
            .registry
            .get_mut(name)
            .ok_or(XmldbError::NotFound(name))?;
        meta.empty_on_load = value;
        Ok(())
    }

    /// Load a datastore's backing file into its cache.
    ///
    /// A tree already in cache is kept as is. A zero-length file loads as an
    /// empty tree and sets the empty flag.
    pub fn load(&mut self, name: StoreName) -> Result<()> {
        if self.cache_get(name).is_some() {
            return Ok(());
        }
        let tree = self.load_file(name)?;
        if self.cache_mode.is_enabled() {
            self.registry.entry(name).cache = Some(tree);
        }
        Ok(())
    }

    /// Independent copy of a datastore's content, from cache or file
    pub fn read(&mut self, name: StoreName) -> Result<ConfigTree> {
        if let Some(tree) = self.cache_get(name) {
            return Ok(tree.deep_copy());
        }
        let tree = self.load_file(name)?;
        if self.cache_mode.is_enabled() {
            self.registry.entry(name).cache = Some(tree.deep_copy());
        }
        Ok(tree)
    }

    /// Parse the backing file and record whether it was empty
    fn load_file(&mut self, name: StoreName) -> Result<ConfigTree> {
        let path = self.registry.resolve(name)?;
        let (tree, empty) = read_tree(&path)?;
        debug!(store = %name, empty, "loaded");
        self.registry.entry(name).empty_on_load = empty;
        Ok(tree)
    }

    /// Write a datastore's cached tree to its backing file.
    ///
    /// Writes nothing and returns `Ok` when no tree is cached, which is
    /// always the case with [`CacheMode::NoCache`].
    pub fn flush(&mut self, name: StoreName) -> Result<()> {
        let Some(tree) = self.cache_get(name) else {
            return Ok(());
        };
        let content = tree.to_json()?;
        let path = self.registry.resolve(name)?;
        let mut file = open_store_file(&path, true)?;
        file.write_all(content.as_bytes())
            .map_err(|e| XmldbError::io("write", &path, e))?;
        debug!(store = %name, bytes = content.len(), "flushed");
        Ok(())
    }

    /// Metadata snapshot of every referenced datastore
    pub fn status(&self) -> Vec<StoreStatus> {
        self.registry
            .names()
            .into_iter()
            .filter_map(|name| {
                let meta = self.registry.get(name)?;
                Some(StoreStatus {
                    name,
                    session: meta.lock_holder,
                    cached: meta.cache.is_some(),
                    modified: meta.modified,
                    empty: meta.empty_on_load,
                })
            })
            .collect()
    }

    /// Print datastore metadata
    pub fn dump(&self, out: &mut impl Write) -> std::io::Result<()> {
        for status in self.status() {
            writeln!(out, "Datastore:  {}", status.name)?;
            match status.session {
                Some(id) => writeln!(out, "  Session:  {id}")?,
                None => writeln!(out, "  Session:  -")?,
            }
            writeln!(out, "  Cached:   {}", status.cached)?;
            writeln!(out, "  Modified: {}", status.modified)?;
            writeln!(out, "  Empty:    {}", status.empty)?;
        }
        Ok(())
    }
}

/// Parse a backing file. Returns the tree and whether the file was empty.
fn read_tree(path: &Path) -> Result<(ConfigTree, bool)> {
    let content = fs::read_to_string(path).map_err(|e| XmldbError::io("read", path, e))?;
    if content.trim().is_empty() {
        return Ok((ConfigTree::new(TOP_NAME), true));
    }
    Ok((ConfigTree::from_json(&content)?, false))
}

/// True if an I/O error only says the file is missing
pub(crate) fn is_missing(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::NotFound
}
