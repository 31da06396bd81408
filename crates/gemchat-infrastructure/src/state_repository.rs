//! Snapshot repositories.
//!
//! Both implementations store the versioned JSON produced by the snapshot
//! migrator, so a file written by one can be read by the other.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use gemchat_core::error::{ChatError, Result};
use gemchat_core::state::{AppSnapshot, StateRepository};

use crate::dto::{SNAPSHOT_ENTITY, create_snapshot_migrator};
use crate::storage::FileKeyValueStore;

fn encode(snapshot: &AppSnapshot) -> Result<String> {
    let migrator = create_snapshot_migrator()?;
    migrator
        .save_domain_flat(SNAPSHOT_ENTITY, snapshot)
        .map_err(|e| ChatError::Serialization {
            format: "JSON".to_string(),
            message: format!("Failed to serialize snapshot: {}", e),
        })
}

fn decode(raw: &str) -> Result<AppSnapshot> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let migrator = create_snapshot_migrator()?;
    migrator
        .load_flat_from(SNAPSHOT_ENTITY, value)
        .map_err(|e| ChatError::migration(format!("Failed to migrate snapshot: {}", e)))
}

/// Persists the snapshot in one slot of a [`FileKeyValueStore`].
#[derive(Debug, Clone)]
pub struct JsonStateRepository {
    store: FileKeyValueStore,
    key: String,
}

impl JsonStateRepository {
    pub fn new(store: FileKeyValueStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl StateRepository for JsonStateRepository {
    fn load(&self) -> Result<Option<AppSnapshot>> {
        let Some(raw) = self.store.get(&self.key)? else {
            debug!(key = %self.key, "No stored snapshot");
            return Ok(None);
        };
        let snapshot = decode(&raw)?;
        info!(
            key = %self.key,
            chatrooms = snapshot.chatrooms.len(),
            "Snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &AppSnapshot) -> Result<()> {
        let json = encode(snapshot)?;
        self.store.set(&self.key, &json)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}

/// Keeps the encoded snapshot in memory. Used for `--ephemeral` sessions.
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    slot: Mutex<Option<String>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoded snapshot as it would appear on disk.
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateRepository for InMemoryStateRepository {
    fn load(&self) -> Result<Option<AppSnapshot>> {
        match self.raw() {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &AppSnapshot) -> Result<()> {
        let json = encode(snapshot)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemchat_core::session::Session;
    use tempfile::TempDir;

    #[test]
    fn test_json_repository_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonStateRepository::new(FileKeyValueStore::new(temp_dir.path()), "gemini-storage");

        assert!(repo.load().unwrap().is_none());

        let mut snapshot = AppSnapshot::seeded(10);
        snapshot.user = Some(Session::new("5551234567", "+1"));
        snapshot.dark = true;
        repo.save(&snapshot).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let raw = std::fs::read_to_string(temp_dir.path().join("gemini-storage.json")).unwrap();
        assert!(raw.contains("\"version\":\"1.0.0\""));
    }

    #[test]
    fn test_json_repository_clear() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonStateRepository::new(FileKeyValueStore::new(temp_dir.path()), "slot");

        repo.save(&AppSnapshot::seeded(1)).unwrap();
        repo.clear().unwrap();

        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("slot.json"), "{not json").unwrap();
        let repo = JsonStateRepository::new(FileKeyValueStore::new(temp_dir.path()), "slot");

        let err = repo.load().unwrap_err();
        assert!(err.is_serialization(), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_in_memory_repository() {
        let repo = InMemoryStateRepository::new();
        assert!(repo.load().unwrap().is_none());

        let snapshot = AppSnapshot::seeded(5);
        repo.save(&snapshot).unwrap();
        assert_eq!(repo.load().unwrap(), Some(snapshot));
        assert!(repo.raw().unwrap().contains("\"selectedChatId\":\"inbox\""));

        repo.clear().unwrap();
        assert!(repo.raw().is_none());
    }
}
