use serde::{Deserialize, Serialize};

use crate::constants::chat::{DEFAULT_TITLE, TITLE_MAX_CHARS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Older state files tagged replies as `"ai"`.
    #[serde(alias = "ai")]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub created_at: i64,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            role,
            content: content.into(),
            created_at: now_millis(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant message with no content yet: a reply still being awaited.
    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Conversation {
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: generate_id(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }

    pub fn message_index(&self, message_id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }

    /// Drop everything before the first user message. A conversation without
    /// any user message ends up empty. Returns the number of messages removed.
    pub fn strip_leading_non_user(&mut self) -> usize {
        let before = self.messages.len();
        match self.messages.iter().position(|m| m.role == Role::User) {
            Some(0) => {}
            Some(first) => {
                self.messages.drain(..first);
            }
            None => self.messages.clear(),
        }
        before - self.messages.len()
    }

    /// Drop empty assistant replies left at the end by a turn that never
    /// settled. Returns the number of messages removed.
    pub fn strip_trailing_placeholders(&mut self) -> usize {
        let before = self.messages.len();
        while self.messages.last().is_some_and(Message::is_placeholder) {
            self.messages.pop();
        }
        before - self.messages.len()
    }

    /// Title a fresh conversation after its first message.
    pub fn derive_title(&mut self, text: &str) {
        if self.title == DEFAULT_TITLE {
            self.title = text.chars().take(TITLE_MAX_CHARS).collect();
        }
    }

    /// Index of the closest user message strictly before `index`.
    pub fn preceding_user_index(&self, index: usize) -> Option<usize> {
        self.messages
            .iter()
            .take(index)
            .rposition(|m| m.role == Role::User)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
