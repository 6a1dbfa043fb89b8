mod model;
mod persistence;
mod store;

pub use model::{generate_id, now_millis, Conversation, Message, Role};
pub use persistence::{FileStorage, MemoryStorage, PersistedState, StateStorage};
pub use store::ChatStore;
