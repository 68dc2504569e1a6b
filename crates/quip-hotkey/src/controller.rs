use crate::backend::{HotkeyBackend, Trigger, TriggerSink};
use crate::binding::{parse_key, parse_modifiers, Hotkey, Key, Modifiers};
use quip_core::{QuipError, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Unregistered,
    Registered(Hotkey),
}

/// Owns the global shortcut and turns its presses into visibility toggles.
///
/// Backends fire on their own thread into a channel; [`ActivationController::pump`]
/// and [`ActivationController::wait`] drain it on the caller's thread, which is
/// the only place the visibility flag changes and the handler runs.
pub struct ActivationController<B: HotkeyBackend> {
    backend: B,
    state: ActivationState,
    generation: u64,
    sender: Sender<Trigger>,
    receiver: Receiver<Trigger>,
    visible: bool,
    handler: Option<Box<dyn FnMut(bool)>>,
}

impl<B: HotkeyBackend> ActivationController<B> {
    pub fn new(backend: B) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            backend,
            state: ActivationState::Unregistered,
            generation: 0,
            sender,
            receiver,
            visible: false,
            handler: None,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn binding(&self) -> Option<Hotkey> {
        match self.state {
            ActivationState::Registered(hotkey) => Some(hotkey),
            ActivationState::Unregistered => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set visibility directly, e.g. when the window hides itself.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Called with the new visibility after every activation.
    pub fn on_activate(&mut self, handler: impl FnMut(bool) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Bind `modifiers` + `key`, replacing the current binding.
    ///
    /// An empty modifier set is rejected with [`QuipError::InvalidBinding`]. On
    /// any error the previous binding stays active.
    pub fn register(&mut self, modifiers: Modifiers, key: Key) -> Result<()> {
        if modifiers.is_empty() {
            return Err(QuipError::InvalidBinding(format!(
                "{} needs at least one modifier",
                key
            )));
        }

        let hotkey = Hotkey::new(modifiers, key);
        let generation = self.generation + 1;
        self.backend
            .register(hotkey, TriggerSink::new(self.sender.clone(), generation))?;

        self.generation = generation;
        self.state = ActivationState::Registered(hotkey);
        info!(%hotkey, "Registered global hotkey");
        Ok(())
    }

    /// Register from settings tokens such as `Control+Alt` and `Q`.
    pub fn register_tokens(&mut self, modifiers: &str, key: &str) -> Result<()> {
        self.register(parse_modifiers(modifiers), parse_key(key))
    }

    pub fn unregister(&mut self) {
        if let ActivationState::Registered(hotkey) = self.state {
            self.backend.unregister();
            // Anything still queued belongs to the released binding.
            self.generation += 1;
            self.state = ActivationState::Unregistered;
            info!(%hotkey, "Released global hotkey");
        }
    }

    /// Handle every queued activation. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(trigger) = self.receiver.try_recv() {
            if self.accept(trigger) {
                handled += 1;
            }
        }
        handled
    }

    /// Block up to `timeout` for an activation, then handle whatever is queued.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(trigger) => usize::from(self.accept(trigger)) + self.pump(),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn accept(&mut self, trigger: Trigger) -> bool {
        if trigger.generation != self.generation || self.binding().is_none() {
            debug!(generation = trigger.generation, "Dropped stale activation");
            return false;
        }

        self.visible = !self.visible;
        debug!(visible = self.visible, "Activation");
        if let Some(handler) = self.handler.as_mut() {
            handler(self.visible);
        }
        true
    }
}

impl<B: HotkeyBackend> Drop for ActivationController<B> {
    fn drop(&mut self) {
        self.unregister();
    }
}
