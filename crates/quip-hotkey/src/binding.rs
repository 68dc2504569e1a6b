use std::fmt;
use std::ops::BitOr;
use tracing::warn;

/// Key used when a configured key name is not recognised.
pub const FALLBACK_KEY: Key = Key::Q;

/// A set of modifier keys held together with the hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CONTROL: Modifiers = Modifiers(0b0001);
    pub const ALT: Modifiers = Modifiers(0b0010);
    pub const SHIFT: Modifiers = Modifiers(0b0100);
    pub const SUPER: Modifiers = Modifiers(0b1000);

    const NAMED: [(Modifiers, &'static str); 4] = [
        (Modifiers::CONTROL, "Control"),
        (Modifiers::ALT, "Alt"),
        (Modifiers::SHIFT, "Shift"),
        (Modifiers::SUPER, "Super"),
    ];

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(m, _)| self.contains(*m))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join("+"))
    }
}

/// Keys a global shortcut can be bound to.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Space, Enter, Tab, Escape, Backspace, Insert, Delete,
    Home, End, PageUp, PageDown, Up, Down, Left, Right,
}

#[rustfmt::skip]
const KEY_NAMES: &[(&str, Key)] = &[
    ("A", Key::A), ("B", Key::B), ("C", Key::C), ("D", Key::D), ("E", Key::E),
    ("F", Key::F), ("G", Key::G), ("H", Key::H), ("I", Key::I), ("J", Key::J),
    ("K", Key::K), ("L", Key::L), ("M", Key::M), ("N", Key::N), ("O", Key::O),
    ("P", Key::P), ("Q", Key::Q), ("R", Key::R), ("S", Key::S), ("T", Key::T),
    ("U", Key::U), ("V", Key::V), ("W", Key::W), ("X", Key::X), ("Y", Key::Y),
    ("Z", Key::Z),
    ("0", Key::Num0), ("1", Key::Num1), ("2", Key::Num2), ("3", Key::Num3), ("4", Key::Num4),
    ("5", Key::Num5), ("6", Key::Num6), ("7", Key::Num7), ("8", Key::Num8), ("9", Key::Num9),
    ("F1", Key::F1), ("F2", Key::F2), ("F3", Key::F3), ("F4", Key::F4),
    ("F5", Key::F5), ("F6", Key::F6), ("F7", Key::F7), ("F8", Key::F8),
    ("F9", Key::F9), ("F10", Key::F10), ("F11", Key::F11), ("F12", Key::F12),
    ("Space", Key::Space), ("Enter", Key::Enter), ("Tab", Key::Tab),
    ("Escape", Key::Escape), ("Backspace", Key::Backspace), ("Insert", Key::Insert),
    ("Delete", Key::Delete), ("Home", Key::Home), ("End", Key::End),
    ("PageUp", Key::PageUp), ("PageDown", Key::PageDown),
    ("Up", Key::Up), ("Down", Key::Down), ("Left", Key::Left), ("Right", Key::Right),
];

// Alternate spellings accepted on input only.
#[rustfmt::skip]
const KEY_ALIASES: &[(&str, Key)] = &[
    ("D0", Key::Num0), ("D1", Key::Num1), ("D2", Key::Num2), ("D3", Key::Num3), ("D4", Key::Num4),
    ("D5", Key::Num5), ("D6", Key::Num6), ("D7", Key::Num7), ("D8", Key::Num8), ("D9", Key::Num9),
    ("Return", Key::Enter), ("Esc", Key::Escape), ("Del", Key::Delete), ("Ins", Key::Insert),
    ("PgUp", Key::PageUp), ("PgDn", Key::PageDown), ("Prior", Key::PageUp), ("Next", Key::PageDown),
];

impl Key {
    pub fn name(self) -> &'static str {
        KEY_NAMES
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }

    /// Look a key up by name, ignoring case. Unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Key> {
        let name = name.trim();
        KEY_NAMES
            .iter()
            .chain(KEY_ALIASES)
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, key)| *key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete shortcut: modifiers plus one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Parse a `+`-separated modifier list such as `Control+Alt`.
///
/// Matching ignores case; unrecognised tokens are skipped.
pub fn parse_modifiers(tokens: &str) -> Modifiers {
    let mut modifiers = Modifiers::NONE;
    for token in tokens.split(&['+', ',', ' '][..]) {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "control" | "ctrl" => modifiers.insert(Modifiers::CONTROL),
            "alt" | "option" => modifiers.insert(Modifiers::ALT),
            "shift" => modifiers.insert(Modifiers::SHIFT),
            "super" | "windows" | "win" | "meta" | "cmd" | "command" => {
                modifiers.insert(Modifiers::SUPER)
            }
            _ => {}
        }
    }
    modifiers
}

/// Parse a key name, falling back to [`FALLBACK_KEY`] when it is unknown.
pub fn parse_key(token: &str) -> Key {
    match Key::from_name(token) {
        Some(key) => key,
        None => {
            warn!(key = token, fallback = %FALLBACK_KEY, "Unknown hotkey key, using fallback");
            FALLBACK_KEY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_parse_known_tokens_only() {
        assert_eq!(
            parse_modifiers("Control+Alt"),
            Modifiers::CONTROL | Modifiers::ALT
        );
        assert_eq!(
            parse_modifiers("ctrl + SHIFT + win"),
            Modifiers::CONTROL | Modifiers::SHIFT | Modifiers::SUPER
        );
        assert_eq!(parse_modifiers("Hyper+Alt+banana"), Modifiers::ALT);
        assert!(parse_modifiers("").is_empty());
        assert!(parse_modifiers("Hyper").is_empty());
    }

    #[test]
    fn keys_parse_case_insensitively() {
        assert_eq!(parse_key("q"), Key::Q);
        assert_eq!(parse_key("W"), Key::W);
        assert_eq!(parse_key("f12"), Key::F12);
        assert_eq!(parse_key("D5"), Key::Num5);
        assert_eq!(parse_key("7"), Key::Num7);
        assert_eq!(parse_key(" space "), Key::Space);
    }

    #[test]
    fn unknown_keys_fall_back() {
        assert_eq!(parse_key("NotAKey"), FALLBACK_KEY);
        assert_eq!(parse_key(""), FALLBACK_KEY);
    }

    #[test]
    fn hotkeys_display_like_settings() {
        let hotkey = Hotkey::new(Modifiers::ALT | Modifiers::CONTROL, Key::Q);
        assert_eq!(hotkey.to_string(), "Control+Alt+Q");
        assert_eq!(parse_modifiers(&hotkey.modifiers.to_string()), hotkey.modifiers);
        assert_eq!(Key::Num3.to_string(), "3");
    }
}
