//! In-memory keyboard for exercising activation without an OS hook.

use crate::backend::{HotkeyBackend, TriggerSink};
use crate::binding::{Hotkey, Modifiers};
use crate::matcher::{ComboMatcher, Input, Side};
use quip_core::{QuipError, Result};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct FakeState {
    active: Option<(Hotkey, TriggerSink)>,
    matcher: ComboMatcher,
    claimed: Vec<Hotkey>,
}

/// A shared fake keyboard. Clones see the same state, so one clone can be
/// handed to a controller as its backend while another presses keys.
#[derive(Clone, Default)]
pub struct FakeKeyboard {
    state: Arc<Mutex<FakeState>>,
}

impl FakeKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pretend another program already owns `hotkey`.
    pub fn claim(&self, hotkey: Hotkey) {
        self.state().claimed.push(hotkey);
    }

    pub fn active(&self) -> Option<Hotkey> {
        self.state().active.as_ref().map(|(hotkey, _)| *hotkey)
    }

    pub fn press(&self, input: Input) {
        let mut state = self.state();
        let FakeState {
            active, matcher, ..
        } = &mut *state;
        if let Some((hotkey, sink)) = active {
            if matcher.press(input, hotkey) {
                sink.fire();
            }
        }
    }

    pub fn release(&self, input: Input) {
        let mut state = self.state();
        let FakeState {
            active, matcher, ..
        } = &mut *state;
        if let Some((hotkey, _)) = active {
            matcher.release(input, hotkey);
        }
    }

    /// Press and release a whole combination.
    pub fn tap(&self, hotkey: Hotkey) {
        let modifiers = modifier_inputs(hotkey.modifiers);
        for input in &modifiers {
            self.press(*input);
        }
        self.press(Input::Key(hotkey.key));
        self.release(Input::Key(hotkey.key));
        for input in modifiers.iter().rev() {
            self.release(*input);
        }
    }
}

fn modifier_inputs(modifiers: Modifiers) -> Vec<Input> {
    [
        Modifiers::CONTROL,
        Modifiers::ALT,
        Modifiers::SHIFT,
        Modifiers::SUPER,
    ]
    .into_iter()
    .filter(|m| modifiers.contains(*m))
    .map(|m| Input::Modifier(m, Side::Left))
    .collect()
}

impl HotkeyBackend for FakeKeyboard {
    fn register(&mut self, hotkey: Hotkey, sink: TriggerSink) -> Result<()> {
        let mut state = self.state();
        if state.claimed.contains(&hotkey) {
            return Err(QuipError::HotkeyConflict(hotkey.to_string()));
        }
        state.active = Some((hotkey, sink));
        state.matcher.rebind();
        Ok(())
    }

    fn unregister(&mut self) {
        let mut state = self.state();
        state.active = None;
        state.matcher.reset();
    }
}
