//! Global keyboard shortcuts bound to the hot message (the one under the
//! pointer). Front ends translate their key events into [`KeyChord`]s and
//! carry out the returned [`Action`].

use crate::chat::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::CTRL)
    }

    fn letter(&self) -> Option<char> {
        match self.key {
            Key::Char(c) => Some(c.to_ascii_lowercase()),
            Key::Other => None,
        }
    }
}

/// The message currently under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct HotMessage {
    pub id: String,
    pub index: usize,
    pub role: Role,
    pub content: String,
}

impl HotMessage {
    pub fn from_message(index: usize, message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            index,
            role: message.role,
            content: message.content.clone(),
        }
    }
}

pub struct InteractionContext<'a> {
    pub dialog_open: bool,
    pub focus_in_editable: bool,
    pub hot: Option<&'a HotMessage>,
    /// Messages of the active conversation.
    pub messages: &'a [Message],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FocusInput,
    Copy(String),
    EditAndResend(String),
    Regenerate { user_index: usize },
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::FocusInput => "Focus input",
            Action::Copy(_) => "Copy message",
            Action::EditAndResend(_) => "Edit & resend",
            Action::Regenerate { .. } => "Regenerate reply",
        }
    }
}

/// Shortcut reference shown in help screens.
pub const SHORTCUTS: &[(&str, &str)] = &[
    ("Ctrl/Cmd+K", "Focus input"),
    ("C", "Copy hovered message"),
    ("E", "Edit & resend hovered user message"),
    ("R", "Regenerate hovered reply"),
];

/// Map a key chord to an action given the current context.
pub fn resolve(chord: KeyChord, ctx: &InteractionContext<'_>) -> Option<Action> {
    if ctx.dialog_open {
        return None;
    }
    let letter = chord.letter()?;

    if letter == 'k' && chord.modifiers.command() {
        return Some(Action::FocusInput);
    }

    if ctx.focus_in_editable || chord.modifiers.any() {
        return None;
    }

    let hot = ctx.hot?;
    match letter {
        'c' => Some(Action::Copy(hot.content.clone())),
        'e' if hot.role == Role::User => Some(Action::EditAndResend(hot.content.clone())),
        'r' if hot.role == Role::Assistant => {
            let upto = hot.index.min(ctx.messages.len());
            ctx.messages[..upto]
                .iter()
                .rposition(|m| m.role == Role::User)
                .map(|user_index| Action::Regenerate { user_index })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> Vec<Message> {
        vec![
            Message::user("What is $CHIP?"),
            Message::assistant("A utility token."),
            Message::user("And dividends?"),
            Message::assistant("Paid quarterly."),
        ]
    }

    fn ctx<'a>(messages: &'a [Message], hot: Option<&'a HotMessage>) -> InteractionContext<'a> {
        InteractionContext {
            dialog_open: false,
            focus_in_editable: false,
            hot,
            messages,
        }
    }

    #[test]
    fn test_focus_input_even_while_editing() {
        let msgs = thread();
        let mut c = ctx(&msgs, None);
        c.focus_in_editable = true;
        assert_eq!(resolve(KeyChord::ctrl('k'), &c), Some(Action::FocusInput));

        let cmd = KeyChord::new(
            Key::Char('K'),
            Modifiers {
                meta: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(resolve(cmd, &c), Some(Action::FocusInput));
    }

    #[test]
    fn test_dialog_blocks_everything() {
        let msgs = thread();
        let hot = HotMessage::from_message(0, &msgs[0]);
        let mut c = ctx(&msgs, Some(&hot));
        c.dialog_open = true;
        assert_eq!(resolve(KeyChord::ctrl('k'), &c), None);
        assert_eq!(resolve(KeyChord::plain('c'), &c), None);
    }

    #[test]
    fn test_letters_need_hot_message() {
        let msgs = thread();
        let c = ctx(&msgs, None);
        assert_eq!(resolve(KeyChord::plain('c'), &c), None);
    }

    #[test]
    fn test_copy_any_role() {
        let msgs = thread();
        let hot = HotMessage::from_message(1, &msgs[1]);
        let c = ctx(&msgs, Some(&hot));
        assert_eq!(
            resolve(KeyChord::plain('C'), &c),
            Some(Action::Copy("A utility token.".into()))
        );
    }

    #[test]
    fn test_edit_only_for_user_messages() {
        let msgs = thread();
        let user = HotMessage::from_message(2, &msgs[2]);
        assert_eq!(
            resolve(KeyChord::plain('e'), &ctx(&msgs, Some(&user))),
            Some(Action::EditAndResend("And dividends?".into()))
        );

        let ai = HotMessage::from_message(3, &msgs[3]);
        assert_eq!(resolve(KeyChord::plain('e'), &ctx(&msgs, Some(&ai))), None);
    }

    #[test]
    fn test_regenerate_targets_preceding_user_message() {
        let msgs = thread();
        let ai = HotMessage::from_message(3, &msgs[3]);
        assert_eq!(
            resolve(KeyChord::plain('r'), &ctx(&msgs, Some(&ai))),
            Some(Action::Regenerate { user_index: 2 })
        );

        let user = HotMessage::from_message(0, &msgs[0]);
        assert_eq!(resolve(KeyChord::plain('r'), &ctx(&msgs, Some(&user))), None);
    }

    #[test]
    fn test_modifiers_and_editable_focus_suppress_letters() {
        let msgs = thread();
        let hot = HotMessage::from_message(1, &msgs[1]);
        let c = ctx(&msgs, Some(&hot));
        let shifted = KeyChord::new(
            Key::Char('c'),
            Modifiers {
                shift: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(resolve(shifted, &c), None);

        let mut editing = ctx(&msgs, Some(&hot));
        editing.focus_in_editable = true;
        assert_eq!(resolve(KeyChord::plain('c'), &editing), None);
    }
}
