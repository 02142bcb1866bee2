//! Copy one datastore's content into another (copy-config, commit, discard)

use std::fs;
use std::io::Write;

use tracing::{debug, error};

use crate::datastore::{Datastore, is_missing};
use crate::error::{Result, XmldbError};
use crate::lifecycle::open_store_file;
use crate::store::StoreName;

impl Datastore {
    /// Replace the content of `to` with the content of `from`.
    ///
    /// Both the cached tree (when caching is enabled) and the backing file are
    /// copied. The destination's lock holder and flags are kept. A missing
    /// source file copies as an empty one.
    ///
    /// The source is fully read and its tree duplicated before the
    /// destination is touched, so `copy(a, a)` leaves `a` unchanged. If
    /// writing the destination file fails midway the destination cache is
    /// released and [`XmldbError::Divergence`] is returned; nothing is rolled
    /// back.
    pub fn copy(&mut self, from: StoreName, to: StoreName) -> Result<()> {
        debug!(%from, %to, "copy");
        let tree = if self.cache_mode().is_enabled() {
            self.cache_get(from).map(|tree| tree.deep_copy())
        } else {
            None
        };

        let from_path = self.registry.resolve(from)?;
        let to_path = self.registry.resolve(to)?;
        let content = match fs::read(&from_path) {
            Ok(content) => content,
            Err(e) if is_missing(&e) => Vec::new(),
            Err(e) => return Err(XmldbError::io("read", &from_path, e)),
        };
        let mut file = open_store_file(&to_path, true)?;

        if let Err(e) = file.write_all(&content) {
            let source = XmldbError::io("write", &to_path, e);
            error!(%from, %to, error = %source, "datastore cache and file diverged during copy");
            self.registry.entry(to).cache = None;
            return Err(XmldbError::Divergence {
                from,
                to,
                source: Box::new(source),
            });
        }

        // Cache follows the file: absent source cache means an empty destination
        self.registry.entry(to).cache = tree;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheMode, DatastoreConfig};
    use crate::store::SessionId;
    use crate::tree::{ConfigTree, TOP_NAME};
    use serde_json::json;
    use tempfile::TempDir;

    fn connect(cache: CacheMode) -> (TempDir, Datastore) {
        let dir = tempfile::tempdir().unwrap();
        let ds = Datastore::connect(DatastoreConfig::new().dir(dir.path()).cache(cache));
        (dir, ds)
    }

    fn write_store(ds: &mut Datastore, name: StoreName, hostname: &str) -> ConfigTree {
        let mut tree = ConfigTree::new(TOP_NAME);
        tree.set_by_path("/system/hostname", json!(hostname));
        ds.create(name).unwrap();
        ds.cache_set(name, tree.clone());
        ds.flush(name).unwrap();
        tree
    }

    #[test]
    fn test_copy_duplicates_cache_and_file() {
        let (dir, mut ds) = connect(CacheMode::Cache);
        let tree = write_store(&mut ds, StoreName::Candidate, "r1");
        write_store(&mut ds, StoreName::Running, "old");

        ds.copy(StoreName::Candidate, StoreName::Running).unwrap();

        assert_eq!(ds.cache_get(StoreName::Running), Some(&tree));
        assert_eq!(
            fs::read(dir.path().join("running_db")).unwrap(),
            fs::read(dir.path().join("candidate_db")).unwrap()
        );
    }

    #[test]
    fn test_copy_is_independent() {
        let (_dir, mut ds) = connect(CacheMode::Cache);
        write_store(&mut ds, StoreName::Running, "r1");

        ds.copy(StoreName::Running, StoreName::Candidate).unwrap();
        ds.cache_get_mut(StoreName::Candidate)
            .unwrap()
            .set_by_path("/system/hostname", json!("r2"));

        assert_eq!(
            ds.cache_get(StoreName::Running).unwrap().get_by_path("/system/hostname"),
            Some(&json!("r1"))
        );
    }

    #[test]
    fn test_copy_from_absent_empties_destination() {
        let (dir, mut ds) = connect(CacheMode::Cache);
        write_store(&mut ds, StoreName::Candidate, "r1");

        ds.copy(StoreName::Tmp, StoreName::Candidate).unwrap();

        assert!(ds.cache_get(StoreName::Candidate).is_none());
        assert_eq!(fs::metadata(dir.path().join("candidate_db")).unwrap().len(), 0);
    }

    #[test]
    fn test_copy_into_self() {
        let (dir, mut ds) = connect(CacheMode::Cache);
        let tree = write_store(&mut ds, StoreName::Running, "r1");
        let before = fs::read(dir.path().join("running_db")).unwrap();

        ds.copy(StoreName::Running, StoreName::Running).unwrap();

        assert_eq!(ds.cache_get(StoreName::Running), Some(&tree));
        assert_eq!(fs::read(dir.path().join("running_db")).unwrap(), before);
    }

    #[test]
    fn test_copy_keeps_destination_metadata() {
        let (_dir, mut ds) = connect(CacheMode::Cache);
        write_store(&mut ds, StoreName::Running, "r1");
        write_store(&mut ds, StoreName::Candidate, "r2");
        ds.lock(StoreName::Candidate, SessionId(5)).unwrap();
        ds.modified_set(StoreName::Candidate, true).unwrap();

        ds.copy(StoreName::Running, StoreName::Candidate).unwrap();

        assert_eq!(ds.is_locked(StoreName::Candidate).unwrap(), Some(SessionId(5)));
        assert!(ds.modified_get(StoreName::Candidate).unwrap());
    }

    #[test]
    fn test_copy_without_cache() {
        let (dir, mut ds) = connect(CacheMode::NoCache);
        fs::write(dir.path().join("startup_db"), r#"{"config": {"a": 1}}"#).unwrap();

        ds.copy(StoreName::Startup, StoreName::Running).unwrap();

        assert!(ds.cache_get(StoreName::Running).is_none());
        assert_eq!(
            fs::read_to_string(dir.path().join("running_db")).unwrap(),
            r#"{"config": {"a": 1}}"#
        );
        assert!(!ds.modified_get(StoreName::Running).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_copy_write_failure_diverges() {
        let (dir, mut ds) = connect(CacheMode::Cache);
        write_store(&mut ds, StoreName::Candidate, "r1");
        ds.cache_set(StoreName::Running, ConfigTree::new(TOP_NAME));
        // Every write to /dev/full fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", dir.path().join("running_db")).unwrap();

        let err = ds.copy(StoreName::Candidate, StoreName::Running).unwrap_err();

        assert!(err.is_divergence());
        assert!(!err.is_not_found());
        assert!(ds.cache_get(StoreName::Running).is_none());
        assert!(ds.cache_get(StoreName::Candidate).is_some());
    }

    #[test]
    fn test_copy_without_dir_changes_nothing() {
        let mut ds = Datastore::connect(DatastoreConfig::new());
        ds.cache_set(StoreName::Candidate, ConfigTree::new(TOP_NAME));

        let err = ds.copy(StoreName::Running, StoreName::Candidate).unwrap_err();
        assert!(matches!(err, XmldbError::Config(_)));
        assert!(ds.cache_get(StoreName::Candidate).is_some());
    }
}
