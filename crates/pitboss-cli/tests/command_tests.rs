use pitboss_cli::commands::{
    complete_command, handle_command, suggestion_label, suggestion_list, CommandResult,
};
use pitboss_core::constants::chat::SUGGESTED_PROMPTS;
use pitboss_core::interaction::SHORTCUTS;
use pitboss_cli::Theme;
use std::path::PathBuf;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

// --- BASIC SLASH COMMANDS ---

#[test]
fn test_help_command() {
    let result = handle_command("/help");

    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("Pit Boss Commands"));
        assert!(msg.contains("/regen"));
        assert!(msg.contains("/ask <n>"));
        for (key, what) in SHORTCUTS {
            assert!(msg.contains(key), "{key}");
            assert!(msg.contains(what), "{what}");
        }
    } else {
        panic!("expected help text");
    }
}

#[test]
fn test_help_command_short_alias() {
    assert!(matches!(handle_command("/h"), CommandResult::Message(_)));
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/quit", "/exit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit, "{cmd}");
    }
}

#[test]
fn test_version_command() {
    if let CommandResult::Message(msg) = handle_command("/version") {
        assert!(msg.starts_with("Pit Boss v"));
    } else {
        panic!("expected version text");
    }
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(handle_command("what's the payout?"), CommandResult::NotACommand);
}

#[test]
fn test_unknown_command() {
    if let CommandResult::Message(msg) = handle_command("/frobnicate now") {
        assert!(msg.contains("Unknown command: /frobnicate"));
    } else {
        panic!("expected unknown-command message");
    }
}

// --- CONVERSATIONS ---

#[test]
fn test_new_and_list() {
    assert_eq!(handle_command("/new"), CommandResult::NewConversation);
    assert_eq!(handle_command("/chats"), CommandResult::ListConversations);
    assert_eq!(handle_command("/ls"), CommandResult::ListConversations);
}

#[test]
fn test_open_requires_argument() {
    assert!(matches!(handle_command("/open"), CommandResult::Message(_)));
    assert_eq!(
        handle_command("/open 3"),
        CommandResult::OpenConversation("3".into())
    );
    assert_eq!(
        handle_command("/open 9f2c"),
        CommandResult::OpenConversation("9f2c".into())
    );
}

#[test]
fn test_rename_keeps_inner_spaces() {
    assert_eq!(
        handle_command("/rename   Weekly dividend plan  "),
        CommandResult::RenameConversation("Weekly dividend plan".into())
    );
    assert!(matches!(handle_command("/rename"), CommandResult::Message(_)));
}

#[test]
fn test_delete_conversation() {
    assert_eq!(handle_command("/delete"), CommandResult::DeleteConversation);
}

#[test]
fn test_search_and_export() {
    assert_eq!(
        handle_command("/search staking"),
        CommandResult::SearchConversations("staking".into())
    );
    assert!(matches!(handle_command("/search"), CommandResult::Message(_)));

    assert_eq!(
        handle_command("/export chats/today.html"),
        CommandResult::Export(PathBuf::from("chats/today.html"))
    );
    assert!(matches!(handle_command("/export"), CommandResult::Message(_)));
}

// --- MESSAGES ---

#[test]
fn test_delmsg_needs_positive_number() {
    assert_eq!(handle_command("/delmsg 2"), CommandResult::DeleteMessage(2));
    assert!(matches!(handle_command("/delmsg 0"), CommandResult::Message(_)));
    assert!(matches!(handle_command("/delmsg two"), CommandResult::Message(_)));
    assert!(matches!(handle_command("/delmsg"), CommandResult::Message(_)));
}

#[test]
fn test_regen_optional_number() {
    assert_eq!(handle_command("/regen"), CommandResult::Regenerate(None));
    assert_eq!(handle_command("/regen 4"), CommandResult::Regenerate(Some(4)));
    assert_eq!(handle_command("/retry"), CommandResult::Regenerate(None));
    assert!(matches!(handle_command("/regen last"), CommandResult::Message(_)));
}

#[test]
fn test_edit_and_cancel() {
    assert_eq!(handle_command("/edit 1"), CommandResult::EditMessage(1));
    assert!(matches!(handle_command("/edit"), CommandResult::Message(_)));
    assert_eq!(handle_command("/cancel"), CommandResult::Cancel);
}

// --- SUGGESTIONS ---

#[test]
fn test_ask_picks_suggestion() {
    assert_eq!(
        handle_command("/ask 1"),
        CommandResult::Ask("What is the Digital Asset Agreement?")
    );
    assert_eq!(
        handle_command("/ask 4"),
        CommandResult::Ask(SUGGESTED_PROMPTS[3])
    );
}

#[test]
fn test_ask_out_of_range_lists_suggestions() {
    for cmd in ["/ask", "/ask 0", "/ask 5", "/ask chips"] {
        if let CommandResult::Message(msg) = handle_command(cmd) {
            assert!(msg.starts_with("Usage: /ask <1-4>"), "{cmd}");
            assert!(msg.contains("3. Can I sell my NFT shares?"), "{cmd}");
        } else {
            panic!("expected usage for {cmd}");
        }
    }
}

#[test]
fn test_suggestion_label_cuts_long_prompts() {
    let long = "How is my ownership and dividend payout verified?";
    let label = suggestion_label(long);
    assert_eq!(label.chars().count(), 44);
    assert!(label.ends_with('…'));
    assert!(long.starts_with(label.trim_end_matches('…')));

    assert_eq!(suggestion_label("Can I sell my NFT shares?"), "Can I sell my NFT shares?");
    assert_eq!(suggestion_list().lines().count(), SUGGESTED_PROMPTS.len());
}

// --- DISPLAY ---

#[test]
fn test_theme_command() {
    assert_eq!(
        handle_command("/theme dracula"),
        CommandResult::ThemeChanged("dracula".into())
    );

    if let CommandResult::Message(msg) = handle_command("/theme") {
        assert!(msg.contains("tokyo-night"));
    } else {
        panic!("expected theme list");
    }
}

#[test]
fn test_theme_lookup() {
    assert_eq!(Theme::by_name("tokyo-night").name, "tokyo-night");
    assert_eq!(Theme::by_name("dracula").name, "dracula");
    assert_eq!(Theme::by_name("neon").name, "dark");
    assert!(Theme::exists("dark"));
    assert!(!Theme::exists("neon"));
}

// --- COMPLETION ---

#[test]
fn test_complete_unique_prefix() {
    assert_eq!(complete_command("/reg"), Some("/regen ".into()));
    assert_eq!(complete_command("/ch"), Some("/chats ".into()));
    assert_eq!(complete_command("/as"), Some("/ask ".into()));
}

#[test]
fn test_complete_ambiguous_prefix() {
    // /delete and /delmsg
    assert_eq!(complete_command("/del"), None);
    assert_eq!(complete_command("/zzz"), None);
}
