//! Capacity-limited key-value store, one file per key.

use std::fs;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

/// Default capacity, matching the usual browser local-storage ceiling.
pub const DEFAULT_CAPACITY: usize = 5 * 1024 * 1024;

pub struct LocalStore {
    dir: PathBuf,
    capacity: usize,
}

impl LocalStore {
    pub fn open(dir: &Path, capacity: usize) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            capacity,
        })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid key {:?}", key)));
        }
        Ok(self.dir.join(key))
    }

    /// Bytes used by every key except `skip`.
    fn usage_excluding(&self, skip: &Path) -> Result<usize, StorageError> {
        let mut used = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().is_some_and(|e| e == "tmp") {
                continue;
            }
            let meta = entry.metadata()?;
            if meta.is_file() {
                used += meta.len() as usize;
            }
        }
        Ok(used)
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        let needed = self.usage_excluding(&path)? + value.len();
        if needed > self.capacity {
            return Err(StorageError::QuotaExceeded {
                needed,
                capacity: self.capacity,
            });
        }

        // Write then rename so a crash never leaves a half-written value
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_overwrite() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path(), 1024).unwrap();

        assert_eq!(store.get("albumsDB").unwrap(), None);
        store.set("albumsDB", "[1]").unwrap();
        store.set("albumsDB", "[1,2]").unwrap();
        assert_eq!(store.get("albumsDB").unwrap().as_deref(), Some("[1,2]"));

        store.remove("albumsDB").unwrap();
        assert_eq!(store.get("albumsDB").unwrap(), None);
        // removing twice is fine
        store.remove("albumsDB").unwrap();
    }

    #[test]
    fn test_quota_counts_other_keys() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path(), 10).unwrap();

        store.set("a", "123456").unwrap();
        // overwriting the same key only counts the new value
        store.set("a", "1234567890").unwrap();

        let err = store.set("b", "x").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 11, capacity: 10 }));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path(), 10).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(StorageError::Unavailable(_))));
    }
}
