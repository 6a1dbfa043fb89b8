use serde_json::Value;

use super::model::{Conversation, Message, Role};
use super::persistence::{PersistedState, StateStorage};
use crate::constants::storage::STATE_KEY;

/// Owns every conversation plus the active pointer, and mirrors both to
/// storage after each change.
pub struct ChatStore {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    storage: Box<dyn StateStorage>,
}

/// What could be recovered from storage at startup.
enum Restored {
    Missing,
    /// Present but unreadable or not a state object. Left on disk untouched.
    Unusable,
    State {
        conversations: Vec<Conversation>,
        active_id: Option<String>,
        skipped: usize,
    },
}

impl ChatStore {
    /// Restore the session from storage. Missing or unusable state yields a
    /// single empty conversation. Conversations that fail to parse are
    /// skipped individually.
    ///
    /// The restored (cleaned) form is written back only when nothing was
    /// lost in parsing, so a damaged file survives until the next change.
    pub fn load(storage: Box<dyn StateStorage>) -> Self {
        let mut store = Self {
            conversations: Vec::new(),
            active_id: None,
            storage,
        };

        let write_back = match store.restore() {
            Restored::State {
                mut conversations,
                active_id,
                skipped,
            } if !conversations.is_empty() => {
                for conv in conversations.iter_mut() {
                    let stripped =
                        conv.strip_leading_non_user() + conv.strip_trailing_placeholders();
                    if stripped > 0 {
                        tracing::debug!("Dropped {stripped} stale messages from {}", conv.id);
                    }
                }

                store.active_id = match active_id {
                    Some(id) if conversations.iter().any(|c| c.id == id) => Some(id),
                    _ => conversations.first().map(|c| c.id.clone()),
                };
                store.conversations = conversations;
                skipped == 0
            }
            restored => {
                let conv = Conversation::new();
                store.active_id = Some(conv.id.clone());
                store.conversations.push(conv);
                match restored {
                    Restored::Missing => true,
                    Restored::Unusable => false,
                    Restored::State { skipped, .. } => skipped == 0,
                }
            }
        };

        if write_back {
            store.save();
        }
        store
    }

    fn restore(&self) -> Restored {
        let raw = match self.storage.read(STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Restored::Missing,
            Err(e) => {
                tracing::warn!("Failed to read chat state: {e}");
                return Restored::Unusable;
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring malformed chat state: {e}");
                return Restored::Unusable;
            }
        };
        let Value::Object(mut state) = value else {
            tracing::warn!("Ignoring chat state that is not an object");
            return Restored::Unusable;
        };

        let active_id = state
            .get("activeConversationId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let entries = match state.remove("conversations") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                tracing::warn!("Ignoring chat state with a non-list conversations field");
                return Restored::Unusable;
            }
        };

        let mut conversations = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in entries {
            match serde_json::from_value::<Conversation>(entry) {
                Ok(conv) => conversations.push(conv),
                Err(e) => {
                    tracing::warn!("Skipping unreadable conversation: {e}");
                    skipped += 1;
                }
            }
        }

        Restored::State {
            conversations,
            active_id,
            skipped,
        }
    }

    /// Serialize the full session. Best effort: failures are logged only.
    pub fn save(&self) {
        let state = PersistedState {
            conversations: self.conversations.clone(),
            active_conversation_id: self.active_id.clone().unwrap_or_default(),
        };

        let blob = match serde_json::to_string(&state) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("Failed to serialize chat state: {e}");
                return;
            }
        };

        if let Err(e) = self.storage.write(STATE_KEY, &blob) {
            tracing::warn!("Failed to persist chat state: {e}");
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// Conversations whose title contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&Conversation> {
        let query_lower = query.to_lowercase();
        self.conversations
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&query_lower))
            .collect()
    }

    // ── Conversation operations ─────────────────────────────────────────

    /// Insert an empty conversation at the head and make it active.
    pub fn create_conversation(&mut self) -> String {
        let conv = Conversation::new();
        let id = conv.id.clone();
        self.conversations.insert(0, conv);
        self.active_id = Some(id.clone());
        self.save();
        id
    }

    /// The active conversation id, creating a conversation if none is active.
    pub fn ensure_active(&mut self) -> String {
        match self.active().map(|c| c.id.clone()) {
            Some(id) => id,
            None => self.create_conversation(),
        }
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active_id = Some(id.to_string());
        self.save();
        true
    }

    pub fn rename_conversation(&mut self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        let Some(conv) = self.get_mut(id) else {
            return false;
        };
        conv.title = title.to_string();
        conv.touch();
        self.save();
        true
    }

    /// Remove a conversation. Deleting the active one activates the first
    /// remaining conversation, or none.
    pub fn delete_conversation(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return false;
        }

        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.conversations.first().map(|c| c.id.clone());
        }
        self.save();
        true
    }

    // ── Message operations ──────────────────────────────────────────────

    pub fn delete_message(&mut self, conversation_id: &str, message_id: &str) -> bool {
        let Some(conv) = self.get_mut(conversation_id) else {
            return false;
        };
        let before = conv.messages.len();
        conv.messages.retain(|m| m.id != message_id);
        if conv.messages.len() == before {
            return false;
        }
        conv.touch();
        self.save();
        true
    }

    /// Append a message. User messages title a still-untitled conversation.
    pub fn append_message(&mut self, conversation_id: &str, message: Message) -> bool {
        let Some(conv) = self.get_mut(conversation_id) else {
            return false;
        };
        if message.role == Role::User {
            conv.derive_title(&message.content);
        }
        conv.messages.push(message);
        conv.touch();
        self.save();
        true
    }

    /// Keep only the first `len` messages.
    pub fn truncate_messages(&mut self, conversation_id: &str, len: usize) -> bool {
        let Some(conv) = self.get_mut(conversation_id) else {
            return false;
        };
        conv.messages.truncate(len);
        conv.touch();
        self.save();
        true
    }

    /// Replace a message's content in place. Not persisted on its own: reveal
    /// increments land here many times a second and the pipeline saves once
    /// the turn settles.
    pub fn set_message_content(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        content: &str,
    ) -> bool {
        let Some(conv) = self.get_mut(conversation_id) else {
            return false;
        };
        let Some(msg) = conv.messages.iter_mut().find(|m| m.id == message_id) else {
            return false;
        };
        msg.content.clear();
        msg.content.push_str(content);
        conv.touch();
        true
    }
}
