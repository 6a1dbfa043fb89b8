use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::chat::{FileStorage, MemoryStorage, StateStorage};
use crate::constants;
use crate::llm::{HttpCompletionClient, ProfileHint};
use crate::pipeline::RevealSchedule;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub completion: CompletionSettings,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub profile: ProfileSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    pub endpoint: String,
    /// Request timeout. `None` leaves the transport default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealSettings {
    pub chunk_chars: usize,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Abort the completion call and reveal of a turn whose conversation or
    /// placeholder was deleted, and drop its late events.
    pub cancel_stale_turns: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: constants::completion::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            chunk_chars: constants::reveal::CHUNK_CHARS,
            interval_ms: constants::reveal::INTERVAL_MS,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            cancel_stale_turns: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pitboss")
            .join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring malformed config {}: {e}", path.display()),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {e}", path.display()),
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), crate::error::PitbossError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), crate::error::PitbossError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PitbossError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The profile hint sent with completion requests, if any name is set.
    pub fn profile_hint(&self) -> Option<ProfileHint> {
        let hint = ProfileHint {
            name: non_empty(&self.profile.name),
            display_name: non_empty(&self.profile.display_name),
        };
        if hint.name.is_none() && hint.display_name.is_none() {
            None
        } else {
            Some(hint)
        }
    }

    pub fn reveal_schedule(&self) -> RevealSchedule {
        RevealSchedule::new(
            self.reveal.chunk_chars,
            Duration::from_millis(self.reveal.interval_ms),
        )
    }

    pub fn state_dir(&self) -> Option<PathBuf> {
        self.storage
            .state_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(constants::storage::STATE_DIR)))
    }

    /// Open the configured storage backend. When the state directory cannot
    /// be created the session runs memory-only.
    pub fn build_storage(&self) -> Box<dyn StateStorage> {
        match self.state_dir() {
            Some(dir) => match FileStorage::with_dir(dir) {
                Ok(storage) => Box::new(storage),
                Err(e) => {
                    tracing::warn!("State storage unavailable, running memory-only: {e}");
                    Box::new(MemoryStorage::new())
                }
            },
            None => {
                tracing::warn!("Could not determine home directory, running memory-only");
                Box::new(MemoryStorage::new())
            }
        }
    }

    pub fn build_completion_client(
        &self,
    ) -> Result<HttpCompletionClient, crate::error::PitbossError> {
        let mut client = HttpCompletionClient::new(&self.completion.endpoint);
        if let Some(secs) = self.completion.timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs))?;
        }
        Ok(client)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
