//! Rename a datastore's backing file, for checkpoint and rollback naming

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::datastore::Datastore;
use crate::error::{Result, XmldbError};
use crate::store::StoreName;

impl Datastore {
    /// Move the backing file of `name` to `new_name` with `suffix` appended.
    ///
    /// `new_name` is a file path taken as given and defaults to the current
    /// backing file. With neither `new_name` nor
    /// `suffix` this is a no-op. Cache and metadata are not touched; callers
    /// renaming a cached store must clear it themselves.
    /// Returns the path the file now lives at.
    pub fn rename(
        &self,
        name: StoreName,
        new_name: Option<&Path>,
        suffix: Option<&str>,
    ) -> Result<PathBuf> {
        let old = self.registry.resolve(name)?;
        if new_name.is_none() && suffix.is_none() {
            return Ok(old);
        }
        let mut target = match new_name {
            Some(path) => path.as_os_str().to_owned(),
            None => old.clone().into_os_string(),
        };
        if let Some(suffix) = suffix {
            target.push(suffix);
        }
        let target = PathBuf::from(target);

        debug!(store = %name, to = %target.display(), "rename");
        fs::rename(&old, &target).map_err(|e| XmldbError::io("rename", &old, e))?;
        Ok(target)
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
    fn test_rename_noop() {
        let (dir, mut ds) = connect();
        ds.create(StoreName::Running).unwrap();

        let path = ds.rename(StoreName::Running, None, None).unwrap();
        assert_eq!(path, dir.path().join("running_db"));
        assert!(path.exists());
    }

    #[test]
    fn test_rename_with_suffix() {
        let (dir, ds) = connect();
        fs::write(dir.path().join("running_db"), "{}").unwrap();

        let path = ds.rename(StoreName::Running, None, Some(".1")).unwrap();
        assert_eq!(path, dir.path().join("running_db.1"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!ds.exists(StoreName::Running).unwrap());
    }

    #[test]
    fn test_rename_to_new_name() {
        let (dir, mut ds) = connect();
        ds.create(StoreName::Tmp).unwrap();

        let rollback = dir.path().join("rollback");
        let path = ds.rename(StoreName::Tmp, Some(&rollback), Some(".0")).unwrap();
        assert_eq!(path, dir.path().join("rollback.0"));
        assert!(path.exists());
        assert!(!dir.path().join("tmp_db").exists());
    }

    #[test]
    fn test_rename_to_other_directory() {
        let (dir, mut ds) = connect();
        let archive = tempfile::tempdir().unwrap();
        ds.create(StoreName::Startup).unwrap();

        let target = archive.path().join("ckpt");
        let path = ds.rename(StoreName::Startup, Some(&target), None).unwrap();
        assert_eq!(path, target);
        assert!(target.exists());
        assert!(!dir.path().join("startup_db").exists());
    }

    #[test]
    fn test_rename_keeps_cache() {
        let (dir, mut ds) = connect();
        ds.create(StoreName::Candidate).unwrap();
        ds.cache_set(StoreName::Candidate, ConfigTree::new(TOP_NAME));

        let old = dir.path().join("candidate-old");
        ds.rename(StoreName::Candidate, Some(&old), None).unwrap();
        assert!(ds.cache_get(StoreName::Candidate).is_some());
    }

    #[test]
    fn test_rename_missing_file() {
        let (_dir, ds) = connect();
        let err = ds.rename(StoreName::Startup, None, Some(".bak")).unwrap_err();
        assert!(err.is_not_found());
    }
}
