use pitboss_core::constants::chat::{SUGGESTED_PROMPTS, SUGGESTION_LABEL_CHARS};
use pitboss_core::interaction::SHORTCUTS;
use std::path::PathBuf;

/// Result of processing a slash command.
///
/// Message numbers are the 1-based numbers shown next to each message in the
/// transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Start a fresh conversation.
    NewConversation,
    /// List conversations in the sidebar order.
    ListConversations,
    /// Switch to a conversation by list number or id prefix.
    OpenConversation(String),
    /// Rename the active conversation.
    RenameConversation(String),
    /// Delete the active conversation (after confirmation).
    DeleteConversation,
    /// Delete a message of the active conversation (after confirmation).
    DeleteMessage(usize),
    /// Regenerate the reply to a message, or the latest one.
    Regenerate(Option<usize>),
    /// Load a user message into the compose field.
    EditMessage(usize),
    /// Cancel the reply in flight for the active conversation.
    Cancel,
    /// Send one of the suggested prompts.
    Ask(&'static str),
    /// Write the active conversation as HTML.
    Export(PathBuf),
    /// Filter conversations by title.
    SearchConversations(String),
    /// Change the theme.
    ThemeChanged(String),
    /// Not a command - treat as regular input.
    NotACommand,
}

pub const COMMANDS: &[&str] = &[
    "/help", "/new", "/chats", "/open", "/rename", "/delete", "/delmsg", "/regen", "/edit",
    "/cancel", "/ask", "/export", "/search", "/theme", "/version", "/quit", "/exit",
];

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/version" => CommandResult::Message(format!("Pit Boss v{}", env!("CARGO_PKG_VERSION"))),

        // Conversations
        "/new" => CommandResult::NewConversation,
        "/chats" | "/ls" => CommandResult::ListConversations,
        "/open" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /open <number|id>".into())
            } else {
                CommandResult::OpenConversation(arg.to_string())
            }
        }
        "/rename" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /rename <title>".into())
            } else {
                CommandResult::RenameConversation(arg.to_string())
            }
        }
        "/delete" => CommandResult::DeleteConversation,
        "/search" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /search <text>".into())
            } else {
                CommandResult::SearchConversations(arg.to_string())
            }
        }
        "/export" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /export <path.html>".into())
            } else {
                CommandResult::Export(PathBuf::from(arg))
            }
        }

        // Messages
        "/delmsg" => match message_number(arg) {
            Some(n) => CommandResult::DeleteMessage(n),
            None => CommandResult::Message("Usage: /delmsg <message-number>".into()),
        },
        "/regen" | "/retry" => {
            if arg.is_empty() {
                CommandResult::Regenerate(None)
            } else {
                match message_number(arg) {
                    Some(n) => CommandResult::Regenerate(Some(n)),
                    None => CommandResult::Message("Usage: /regen [message-number]".into()),
                }
            }
        }
        "/edit" => match message_number(arg) {
            Some(n) => CommandResult::EditMessage(n),
            None => CommandResult::Message("Usage: /edit <message-number>".into()),
        },
        "/cancel" => CommandResult::Cancel,
        "/ask" => match message_number(arg).and_then(|n| SUGGESTED_PROMPTS.get(n - 1)) {
            Some(prompt) => CommandResult::Ask(*prompt),
            None => CommandResult::Message(format!(
                "Usage: /ask <1-{}>\n{}",
                SUGGESTED_PROMPTS.len(),
                suggestion_list()
            )),
        },

        // Display
        "/theme" => {
            if arg.is_empty() {
                let themes = crate::theme::Theme::all_names().join(", ");
                CommandResult::Message(format!("Available themes: {themes}\nUsage: /theme <theme-name>"))
            } else {
                CommandResult::ThemeChanged(arg.to_string())
            }
        }

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn message_number(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|n| *n >= 1)
}

/// Complete a unique command prefix.
pub fn complete_command(input: &str) -> Option<String> {
    let matches: Vec<&&str> = COMMANDS.iter().filter(|c| c.starts_with(input)).collect();

    if matches.len() == 1 {
        Some(format!("{} ", matches[0]))
    } else {
        None
    }
}

/// Label for a suggestion button: long prompts are cut and end in "…".
pub fn suggestion_label(prompt: &str) -> String {
    if prompt.chars().count() <= SUGGESTION_LABEL_CHARS {
        return prompt.to_string();
    }
    let mut label: String = prompt.chars().take(SUGGESTION_LABEL_CHARS - 1).collect();
    label.push('…');
    label
}

/// Numbered suggestion labels, one per line.
pub fn suggestion_list() -> String {
    SUGGESTED_PROMPTS
        .iter()
        .enumerate()
        .map(|(i, prompt)| format!("  {}. {}", i + 1, suggestion_label(prompt)))
        .collect::<Vec<_>>()
        .join("\n")
}

const KEYS: &[(&str, &str)] = &[
    ("Enter", "Send"),
    ("Esc / Tab", "Move between input and transcript"),
    ("Up / Down", "Pick a message (transcript)"),
    ("1-4", "Ask a suggested question (new chat)"),
    ("Ctrl+N", "New conversation"),
    ("Ctrl+B", "Toggle chat list"),
    ("Ctrl+C", "Cancel reply, or quit"),
];

fn show_help() -> CommandResult {
    let mut help_text = String::from(
        "\
╭─ Pit Boss Commands ────────────────────────────────────────────╮

  CONVERSATIONS
    /new                      Start a fresh conversation
    /chats                    List conversations
    /open <n|id>              Switch to a conversation
    /rename <title>           Rename the current conversation
    /delete                   Delete the current conversation
    /search <text>            Find conversations by title
    /export <path>            Save the conversation as HTML

  MESSAGES
    /ask <n>                  Send suggested question n
    /regen [n]                Regenerate the reply to message n
    /edit <n>                 Load message n into the input
    /delmsg <n>               Delete message n
    /cancel                   Stop the reply in progress

  KEYS
",
    );

    for (key, what) in KEYS.iter().chain(SHORTCUTS) {
        help_text.push_str(&format!("    {key:<26}{what}\n"));
    }

    help_text.push_str(
        "
  OTHER
    /theme <name>             Change color theme
    /version                  Show version information
    /help, /h                 Show this help message
    /quit, /exit, /q          Quit the application

╰────────────────────────────────────────────────────────────────╯",
    );

    CommandResult::Message(help_text)
}
