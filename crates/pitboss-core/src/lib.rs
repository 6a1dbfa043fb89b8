pub mod error;
pub mod constants;
pub mod config;
pub mod chat;
pub mod llm;
pub mod pipeline;
pub mod markdown;
pub mod interaction;

// Re-export key types
pub use error::PitbossError;
pub use config::Settings;
pub use chat::{ChatStore, Conversation, FileStorage, MemoryStorage, Message, Role, StateStorage};
pub use llm::{CompletionClient, CompletionRequest, HttpCompletionClient, ProfileHint};
pub use pipeline::{Pipeline, RevealSchedule, TurnEvent, TurnKind, TurnRequest};
