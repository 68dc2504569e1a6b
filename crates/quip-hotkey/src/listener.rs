use crate::backend::{HotkeyBackend, TriggerSink};
use crate::binding::{Hotkey, Key, Modifiers};
use crate::matcher::{ComboMatcher, Input, Side};
use quip_core::{QuipError, Result};
use rdev::{self, EventType, Key as RdevKey};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// How long to wait for the OS hook to refuse us before assuming it is up.
const STARTUP_GRACE: Duration = Duration::from_millis(250);

struct Binding {
    hotkey: Hotkey,
    sink: TriggerSink,
    matcher: ComboMatcher,
}

type Shared = Arc<Mutex<Option<Binding>>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Option<Binding>> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Global hotkey backend built on an `rdev` keyboard hook.
///
/// The hook thread is started on the first registration and lives for the
/// rest of the process; `rdev` cannot stop it. Re-registering swaps the
/// binding under a lock, so the old combination stops matching at the same
/// moment the new one starts. The hook observes keys without grabbing them,
/// so shortcuts held by other programs are not detected as conflicts.
pub struct RdevBackend {
    binding: Shared,
    listener: Option<JoinHandle<()>>,
}

impl RdevBackend {
    pub fn new() -> Self {
        Self {
            binding: Arc::new(Mutex::new(None)),
            listener: None,
        }
    }

    fn ensure_listener(&mut self) -> Result<()> {
        if let Some(handle) = &self.listener {
            if !handle.is_finished() {
                return Ok(());
            }
        }

        let (failed_tx, failed_rx) = mpsc::channel();
        let handle = start_keyboard_listener(Arc::clone(&self.binding), failed_tx);

        match failed_rx.recv_timeout(STARTUP_GRACE) {
            Ok(reason) => {
                let _ = handle.join();
                Err(QuipError::Keyboard(reason))
            }
            Err(_) => {
                info!("Keyboard hook started");
                self.listener = Some(handle);
                Ok(())
            }
        }
    }
}

impl Default for RdevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyBackend for RdevBackend {
    fn register(&mut self, hotkey: Hotkey, sink: TriggerSink) -> Result<()> {
        self.ensure_listener()?;
        let mut binding = lock(&self.binding);
        // Keys already held carry over to the new combination.
        let mut matcher = binding
            .take()
            .map(|previous| previous.matcher)
            .unwrap_or_default();
        matcher.rebind();
        *binding = Some(Binding {
            hotkey,
            sink,
            matcher,
        });
        Ok(())
    }

    fn unregister(&mut self) {
        lock(&self.binding).take();
    }
}

/// Spawn the hook thread. Reports a refused hook on `failed`.
fn start_keyboard_listener(binding: Shared, failed: mpsc::Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let callback = move |event: rdev::Event| {
            let (input, pressed) = match event.event_type {
                EventType::KeyPress(key) => (map_key(key), true),
                EventType::KeyRelease(key) => (map_key(key), false),
                _ => return,
            };
            let Some(input) = input else {
                return;
            };

            let mut guard = lock(&binding);
            let Some(active) = guard.as_mut() else {
                return;
            };

            if pressed {
                if active.matcher.press(input, &active.hotkey) {
                    debug!(hotkey = %active.hotkey, "Hotkey pressed");
                    active.sink.fire();
                }
            } else {
                active.matcher.release(input, &active.hotkey);
            }
        };

        // listen() only returns when the hook could not be installed.
        if let Err(e) = rdev::listen(callback) {
            let reason = format!("Failed to start keyboard listener: {:?}", e);
            error!("{}", reason);
            let _ = failed.send(reason);
        }
    })
}

fn map_key(key: RdevKey) -> Option<Input> {
    let input = match key {
        RdevKey::ControlLeft => Input::Modifier(Modifiers::CONTROL, Side::Left),
        RdevKey::ControlRight => Input::Modifier(Modifiers::CONTROL, Side::Right),
        RdevKey::Alt => Input::Modifier(Modifiers::ALT, Side::Left),
        RdevKey::AltGr => Input::Modifier(Modifiers::ALT, Side::Right),
        RdevKey::ShiftLeft => Input::Modifier(Modifiers::SHIFT, Side::Left),
        RdevKey::ShiftRight => Input::Modifier(Modifiers::SHIFT, Side::Right),
        RdevKey::MetaLeft => Input::Modifier(Modifiers::SUPER, Side::Left),
        RdevKey::MetaRight => Input::Modifier(Modifiers::SUPER, Side::Right),
        other => Input::Key(map_plain_key(other)?),
    };
    Some(input)
}

fn map_plain_key(key: RdevKey) -> Option<Key> {
    let key = match key {
        RdevKey::KeyA => Key::A,
        RdevKey::KeyB => Key::B,
        RdevKey::KeyC => Key::C,
        RdevKey::KeyD => Key::D,
        RdevKey::KeyE => Key::E,
        RdevKey::KeyF => Key::F,
        RdevKey::KeyG => Key::G,
        RdevKey::KeyH => Key::H,
        RdevKey::KeyI => Key::I,
        RdevKey::KeyJ => Key::J,
        RdevKey::KeyK => Key::K,
        RdevKey::KeyL => Key::L,
        RdevKey::KeyM => Key::M,
        RdevKey::KeyN => Key::N,
        RdevKey::KeyO => Key::O,
        RdevKey::KeyP => Key::P,
        RdevKey::KeyQ => Key::Q,
        RdevKey::KeyR => Key::R,
        RdevKey::KeyS => Key::S,
        RdevKey::KeyT => Key::T,
        RdevKey::KeyU => Key::U,
        RdevKey::KeyV => Key::V,
        RdevKey::KeyW => Key::W,
        RdevKey::KeyX => Key::X,
        RdevKey::KeyY => Key::Y,
        RdevKey::KeyZ => Key::Z,
        RdevKey::Num0 => Key::Num0,
        RdevKey::Num1 => Key::Num1,
        RdevKey::Num2 => Key::Num2,
        RdevKey::Num3 => Key::Num3,
        RdevKey::Num4 => Key::Num4,
        RdevKey::Num5 => Key::Num5,
        RdevKey::Num6 => Key::Num6,
        RdevKey::Num7 => Key::Num7,
        RdevKey::Num8 => Key::Num8,
        RdevKey::Num9 => Key::Num9,
        RdevKey::F1 => Key::F1,
        RdevKey::F2 => Key::F2,
        RdevKey::F3 => Key::F3,
        RdevKey::F4 => Key::F4,
        RdevKey::F5 => Key::F5,
        RdevKey::F6 => Key::F6,
        RdevKey::F7 => Key::F7,
        RdevKey::F8 => Key::F8,
        RdevKey::F9 => Key::F9,
        RdevKey::F10 => Key::F10,
        RdevKey::F11 => Key::F11,
        RdevKey::F12 => Key::F12,
        RdevKey::Space => Key::Space,
        RdevKey::Return => Key::Enter,
        RdevKey::Tab => Key::Tab,
        RdevKey::Escape => Key::Escape,
        RdevKey::Backspace => Key::Backspace,
        RdevKey::Insert => Key::Insert,
        RdevKey::Delete => Key::Delete,
        RdevKey::Home => Key::Home,
        RdevKey::End => Key::End,
        RdevKey::PageUp => Key::PageUp,
        RdevKey::PageDown => Key::PageDown,
        RdevKey::UpArrow => Key::Up,
        RdevKey::DownArrow => Key::Down,
        RdevKey::LeftArrow => Key::Left,
        RdevKey::RightArrow => Key::Right,
        _ => return None,
    };
    Some(key)
}
