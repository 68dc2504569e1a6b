//! Global hotkey activation for quip.
//!
//! [`ActivationController`] owns the shortcut and a visibility flag. The OS
//! side sits behind [`HotkeyBackend`]: [`RdevBackend`] hooks the real
//! keyboard, [`FakeKeyboard`] drives everything from code.

pub mod backend;
pub mod binding;
pub mod controller;
pub mod fake;
pub mod listener;
pub mod matcher;

pub use backend::{HotkeyBackend, Trigger, TriggerSink};
pub use binding::{parse_key, parse_modifiers, Hotkey, Key, Modifiers, FALLBACK_KEY};
pub use controller::{ActivationController, ActivationState};
pub use fake::FakeKeyboard;
pub use listener::RdevBackend;
