pub mod events;

use self::events::KeyEvent;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Carries key transitions from an input thread to the game loop.
pub struct InputQueue {
    sender: Sender<KeyEvent>,
    receiver: Receiver<KeyEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn push(&self, event: KeyEvent) {
        // the queue owns a receiver, so sending cannot fail
        let _ = self.sender.send(event);
    }

    /// Non-blocking.
    pub fn pop(&self) -> Option<KeyEvent> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued right now, in arrival order.
    pub fn drain(&self) -> impl Iterator<Item = KeyEvent> + '_ {
        self.receiver.try_iter()
    }

    pub fn sender(&self) -> Sender<KeyEvent> {
        self.sender.clone()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
