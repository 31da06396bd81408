//! Directory-backed key-value store.
//!
//! Each key maps to `{dir}/{key}.json`; values are opaque strings written
//! through [`AtomicFile`].

use std::path::{Path, PathBuf};

use tracing::debug;

use super::atomic_file::{AtomicFile, StorageError};

/// String slots stored as one file per key.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the stored value, or `None` when the slot is empty.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.slot(key)?.read()
    }

    /// Overwrites the slot with `value`.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let slot = self.slot(key)?;
        slot.write(value)?;
        debug!(key, path = %slot.path().display(), bytes = value.len(), "Slot written");
        Ok(())
    }

    /// Empties the slot. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.slot(key)?.remove()
    }

    fn slot(&self, key: &str) -> Result<AtomicFile, StorageError> {
        validate_key(key)?;
        Ok(AtomicFile::new(self.dir.join(format!("{}.json", key))))
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if key.is_empty() || !valid_chars || key.starts_with('.') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        assert!(store.get("gemini-storage").unwrap().is_none());

        store.set("gemini-storage", "{}").unwrap();
        assert_eq!(store.get("gemini-storage").unwrap().as_deref(), Some("{}"));
        assert!(temp_dir.path().join("gemini-storage.json").exists());

        store.remove("gemini-storage").unwrap();
        assert!(store.get("gemini-storage").unwrap().is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();

        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        for key in ["", "../escape", "a/b", ".hidden", "with space"] {
            let result = store.set(key, "x");
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
