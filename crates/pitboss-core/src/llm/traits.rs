use crate::chat::{Message, Role};
use crate::error::PitbossError;
use serde::{Deserialize, Serialize};

/// One history entry as the completion endpoint expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Personalization hint forwarded with every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileHint>,
}

impl ProfileHint {
    /// The name to show for the user: display name first, then name.
    pub fn label(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.name.as_deref())
    }
}

impl CompletionRequest {
    pub fn from_history(history: &[Message], profile: Option<&ProfileHint>) -> Self {
        Self {
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
            profile: profile.cloned(),
        }
    }
}

/// The external endpoint producing a single assistant reply for a history.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, PitbossError>;
}
