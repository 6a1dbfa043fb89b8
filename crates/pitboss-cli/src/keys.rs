use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pitboss_core::interaction::{Key, KeyChord, Modifiers};

/// Translate a terminal key event for the shortcut resolver.
pub fn to_chord(key: &KeyEvent) -> KeyChord {
    let m = key.modifiers;
    let modifiers = Modifiers {
        ctrl: m.contains(KeyModifiers::CONTROL),
        alt: m.contains(KeyModifiers::ALT),
        shift: m.contains(KeyModifiers::SHIFT),
        meta: m.contains(KeyModifiers::SUPER) || m.contains(KeyModifiers::META),
    };
    let key = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    };
    KeyChord::new(key, modifiers)
}
