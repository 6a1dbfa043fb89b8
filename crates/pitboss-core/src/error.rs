use thiserror::Error;

#[derive(Error, Debug)]
pub enum PitbossError {
    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Completion endpoint returned {status}: {body}")]
    CompletionStatus { status: u16, body: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No active conversation")]
    NoActiveConversation,

    #[error("A turn is already in flight for conversation {0}")]
    TurnInFlight(String),

    #[error("Message {0} is not a user message in the active conversation")]
    InvalidMessageIndex(usize),

    #[error("{0}")]
    Other(String),

    #[error("Turn cancelled")]
    Cancelled,
}

impl PitbossError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::CompletionStatus {
            status,
            body: body.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PitbossError>;
