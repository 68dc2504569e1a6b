use crate::binding::Hotkey;
use quip_core::Result;
use std::sync::mpsc::Sender;

/// One activation, tagged with the registration that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub generation: u64,
}

/// Where a backend delivers activations. Safe to use from any thread.
#[derive(Debug, Clone)]
pub struct TriggerSink {
    sender: Sender<Trigger>,
    generation: u64,
}

impl TriggerSink {
    pub fn new(sender: Sender<Trigger>, generation: u64) -> Self {
        Self { sender, generation }
    }

    /// Send one activation. Returns false once the receiving side is gone.
    pub fn fire(&self) -> bool {
        self.sender
            .send(Trigger {
                generation: self.generation,
            })
            .is_ok()
    }
}

/// OS capability for system-wide shortcuts.
pub trait HotkeyBackend {
    /// Start delivering presses of `hotkey` to `sink`, replacing any current binding.
    ///
    /// On error the previous binding, if any, must still be active.
    fn register(&mut self, hotkey: Hotkey, sink: TriggerSink) -> Result<()>;

    /// Stop delivering activations. Does nothing when nothing is bound.
    fn unregister(&mut self);
}
