// Library interface for pitboss-cli
// This allows integration tests to access internal modules

// NOTE: These modules are also declared in main.rs, so they are pulled in
// by path to avoid "file loaded multiple times" errors.

#[path = "commands.rs"]
pub mod commands;

#[path = "keys.rs"]
pub mod keys;

#[path = "theme.rs"]
pub mod theme;

// Re-export commonly used items for easier testing
pub use commands::{complete_command, handle_command, CommandResult};
pub use keys::to_chord;
pub use theme::Theme;
