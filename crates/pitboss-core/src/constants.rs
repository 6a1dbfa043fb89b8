/// Pit Boss centralized constants.
/// Fixed strings, keys and timing defaults live here.

// ─── Storage ──────────────────────────────────────────────────────────────────

pub mod storage {
    /// Key of the single persisted blob holding every conversation.
    pub const STATE_KEY: &str = "pitboss_chats_v1";
    /// Directory under the home dir used when no state dir is configured.
    pub const STATE_DIR: &str = ".pitboss/state";
}

// ─── Conversations ────────────────────────────────────────────────────────────

pub mod chat {
    pub const DEFAULT_TITLE: &str = "New chat";
    /// How replies are attributed in transcripts and exports.
    pub const ASSISTANT_NAME: &str = "Pit Boss";
    /// Characters of the first user message used as the derived title.
    pub const TITLE_MAX_CHARS: usize = 40;
    /// Author label for user messages when the profile has no name.
    pub const DEFAULT_USER_NAME: &str = "You";

    /// Offered until a conversation has its first user message.
    pub const SUGGESTED_PROMPTS: &[&str] = &[
        "What is the Digital Asset Agreement?",
        "How is my ownership and dividend payout verified?",
        "Can I sell my NFT shares?",
        "What is the purpose of the $CHIP token?",
    ];
    /// Longer suggestion labels are cut to this many chars, ellipsis included.
    pub const SUGGESTION_LABEL_CHARS: usize = 44;
}

// ─── Completion collaborator ──────────────────────────────────────────────────

pub mod completion {
    pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/pitboss";

    pub const SEND_FALLBACK: &str =
        "I had trouble reaching the model. Please try again in a moment.";
    pub const REGENERATE_FALLBACK: &str = "Retry failed. Please try again.";
    /// Used when a 2xx response carries no `content` field.
    pub const EMPTY_RESPONSE: &str = "Sorry, I couldn't generate a response.";
}

// ─── Reveal animation ─────────────────────────────────────────────────────────

pub mod reveal {
    pub const CHUNK_CHARS: usize = 3;
    pub const INTERVAL_MS: u64 = 15;
}
