use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::model::Conversation;
use crate::error::PitbossError;

/// The single blob persisted under the state key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    /// Empty when no conversation is active.
    #[serde(default)]
    pub active_conversation_id: String,
}

/// Key/value blob storage for session state.
pub trait StateStorage: Send {
    fn read(&self, key: &str) -> Result<Option<String>, PitbossError>;
    fn write(&self, key: &str, blob: &str) -> Result<(), PitbossError>;
}

/// Stores each key as `<key>.json` inside a directory.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn with_dir(base_dir: PathBuf) -> Result<Self, PitbossError> {
        fs::create_dir_all(&base_dir).map_err(|e| {
            PitbossError::Storage(format!(
                "Failed to create state directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        Ok(Self { base_dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl StateStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PitbossError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path).map(Some).map_err(|e| {
            PitbossError::Storage(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), PitbossError> {
        let path = self.key_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, blob).map_err(|e| {
            PitbossError::Storage(format!("Failed to write temporary state file: {}", e))
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            PitbossError::Storage(format!("Failed to rename state file: {}", e))
        })?;

        Ok(())
    }
}

/// In-process storage. Clones share the same map, so a test can reopen a
/// store over the blobs a previous one wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.get(key).cloned()
    }

    pub fn insert(&self, key: &str, blob: impl Into<String>) {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), blob.into());
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PitbossError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), PitbossError> {
        self.insert(key, blob);
        Ok(())
    }
}
