//! Backing file lifecycle: exists, create, delete, reset
//!
//! A store is never unlinked. Deleting it truncates the backing file to zero
//! length, and a zero-length file counts as not existing. A process that has
//! dropped privileges can therefore always recreate a store without write
//! access to the datastore directory.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use tracing::debug;

use crate::datastore::{Datastore, is_missing};
use crate::error::{Result, XmldbError};
use crate::store::{Existence, StoreName};

/// Open a backing file for writing, creating it owner-only if missing
pub(crate) fn open_store_file(path: &Path, truncate: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(truncate);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o700);
    }
    options
        .open(path)
        .map_err(|e| XmldbError::io("open", path, e))
}

impl Datastore {
    /// Three-way state of a datastore's backing file
    pub fn existence(&self, name: StoreName) -> Result<Existence> {
        let path = self.registry.resolve(name)?;
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.len() == 0 => Ok(Existence::Empty),
            Ok(_) => Ok(Existence::Present),
            Err(e) if is_missing(&e) => Ok(Existence::Absent),
            Err(e) => Err(XmldbError::io("lstat", path, e)),
        }
    }

    /// Check if a datastore exists. An empty backing file does not count.
    pub fn exists(&self, name: StoreName) -> Result<bool> {
        debug!(store = %name, "exists");
        Ok(self.existence(name)?.is_present())
    }

    /// Create a datastore: drop its cache and open the backing file.
    /// Existing content is left in place.
    pub fn create(&mut self, name: StoreName) -> Result<()> {
        debug!(store = %name, "create");
        self.registry.entry(name).cache = None;
        let path = self.registry.resolve(name)?;
        open_store_file(&path, false)?;
        Ok(())
    }

    /// Delete a datastore: drop its cache and truncate the backing file.
    pub fn delete(&mut self, name: StoreName) -> Result<()> {
        debug!(store = %name, "delete");
        self.clear(name);
        let path = self.registry.resolve(name)?;
        if self.existence(name)? != Existence::Present {
            return Ok(());
        }
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| XmldbError::io("truncate", &path, e))?;
        file.set_len(0)
            .map_err(|e| XmldbError::io("truncate", &path, e))?;
        Ok(())
    }

    /// Reset a datastore to the empty-but-present state.
    /// A backing file that cannot be inspected is left for `create` to report.
    pub fn reset(&mut self, name: StoreName) -> Result<()> {
        if matches!(self.existence(name), Ok(Existence::Present)) {
            match self.delete(name) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(store = %name, "vanished before reset");
                }
                Err(e) => return Err(e),
            }
        }
        self.create(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatastoreConfig;
    use crate::tree::{ConfigTree, TOP_NAME};
    use tempfile::TempDir;

    fn connect() -> (TempDir, Datastore) {
        let dir = tempfile::tempdir().unwrap();
        let ds = Datastore::connect(DatastoreConfig::new().dir(dir.path()));
        (dir, ds)
    }

    #[test]
    fn test_existence_states() {
        let (dir, mut ds) = connect();
        assert_eq!(ds.existence(StoreName::Running).unwrap(), Existence::Absent);

        ds.create(StoreName::Running).unwrap();
        assert_eq!(ds.existence(StoreName::Running).unwrap(), Existence::Empty);
        assert!(!ds.exists(StoreName::Running).unwrap());

        fs::write(dir.path().join("running_db"), "{}").unwrap();
        assert_eq!(ds.existence(StoreName::Running).unwrap(), Existence::Present);
        assert!(ds.exists(StoreName::Running).unwrap());
    }

    #[test]
    fn test_create_drops_cache_and_keeps_content() {
        let (dir, mut ds) = connect();
        fs::write(dir.path().join("candidate_db"), "{}").unwrap();
        ds.cache_set(StoreName::Candidate, ConfigTree::new(TOP_NAME));

        ds.create(StoreName::Candidate).unwrap();
        assert!(ds.cache_get(StoreName::Candidate).is_none());
        assert_eq!(fs::read_to_string(dir.path().join("candidate_db")).unwrap(), "{}");
        assert!(!ds.modified_get(StoreName::Candidate).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, mut ds) = connect();
        ds.create(StoreName::Tmp).unwrap();
        let mode = fs::metadata(dir.path().join("tmp_db")).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_delete_truncates_but_keeps_file() {
        let (dir, mut ds) = connect();
        let path = dir.path().join("startup_db");
        fs::write(&path, r#"{"config": {"a": 1}}"#).unwrap();
        ds.cache_set(StoreName::Startup, ConfigTree::new(TOP_NAME));

        ds.delete(StoreName::Startup).unwrap();
        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(ds.cache_get(StoreName::Startup).is_none());
        assert!(!ds.exists(StoreName::Startup).unwrap());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (dir, mut ds) = connect();
        ds.delete(StoreName::Tmp).unwrap();
        assert!(!dir.path().join("tmp_db").exists());
    }

    #[test]
    fn test_operations_without_dir() {
        let mut ds = Datastore::connect(DatastoreConfig::new());
        assert!(matches!(ds.create(StoreName::Running), Err(XmldbError::Config(_))));
        assert!(matches!(ds.exists(StoreName::Running), Err(XmldbError::Config(_))));
        assert!(matches!(ds.reset(StoreName::Running), Err(XmldbError::Config(_))));
    }

    #[test]
    fn test_reset_reports_create_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the datastore directory should be
        let not_a_dir = dir.path().join("db");
        fs::write(&not_a_dir, "").unwrap();
        let mut ds = Datastore::connect(DatastoreConfig::new().dir(&not_a_dir));

        assert!(matches!(
            ds.existence(StoreName::Running),
            Err(XmldbError::Io { op: "lstat", .. })
        ));
        assert!(matches!(
            ds.reset(StoreName::Running),
            Err(XmldbError::Io { op: "open", .. })
        ));
    }

    #[test]
    fn test_reset_absent_and_present_agree() {
        let (dir, mut ds) = connect();
        fs::write(dir.path().join("running_db"), r#"{"config": {"a": 1}}"#).unwrap();

        ds.reset(StoreName::Running).unwrap();
        ds.reset(StoreName::Candidate).unwrap();

        for name in [StoreName::Running, StoreName::Candidate] {
            assert_eq!(ds.existence(name).unwrap(), Existence::Empty);
            assert!(ds.cache_get(name).is_none());
        }
    }
}
