use crate::binding::{Hotkey, Key, Modifiers};

/// Which side of the keyboard a modifier key sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A physical key as seen by a keyboard hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Modifier(Modifiers, Side),
    Key(Key),
}

/// Turns a raw press/release stream into one activation per combination press.
///
/// The combination fires when its key goes down while exactly its modifiers
/// are held. Auto-repeat presses are ignored until the key is released.
#[derive(Debug, Default)]
pub struct ComboMatcher {
    left: Modifiers,
    right: Modifiers,
    fired: bool,
}

impl ComboMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> Modifiers {
        self.left | self.right
    }

    /// Feed a key press. Returns true when `hotkey` should activate.
    pub fn press(&mut self, input: Input, hotkey: &Hotkey) -> bool {
        match input {
            Input::Modifier(modifier, Side::Left) => self.left.insert(modifier),
            Input::Modifier(modifier, Side::Right) => self.right.insert(modifier),
            Input::Key(key) => {
                if key == hotkey.key && self.held() == hotkey.modifiers && !self.fired {
                    self.fired = true;
                    return true;
                }
            }
        }
        false
    }

    pub fn release(&mut self, input: Input, hotkey: &Hotkey) {
        match input {
            Input::Modifier(modifier, Side::Left) => self.left = remove(self.left, modifier),
            Input::Modifier(modifier, Side::Right) => self.right = remove(self.right, modifier),
            Input::Key(key) => {
                if key == hotkey.key {
                    self.fired = false;
                }
            }
        }
    }

    /// Prepare for a new binding. Modifiers still held keep counting.
    pub fn rebind(&mut self) {
        self.fired = false;
    }

    /// Forget held keys, e.g. after the binding was released.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn remove(set: Modifiers, modifier: Modifiers) -> Modifiers {
    let mut rest = Modifiers::NONE;
    for candidate in [
        Modifiers::CONTROL,
        Modifiers::ALT,
        Modifiers::SHIFT,
        Modifiers::SUPER,
    ] {
        if set.contains(candidate) && !modifier.contains(candidate) {
            rest.insert(candidate);
        }
    }
    rest
}
