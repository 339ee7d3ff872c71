//! Per-kind holding area for decoded frames.
//!
//! Frames are read opportunistically: while waiting for one reply the bridge
//! may decode others. Each kind gets a single slot; a newer frame of the same
//! kind replaces an unclaimed older one.

use crate::ipc::message::{Message, MessageKind};

use std::collections::HashMap;

use log::debug;

#[derive(Debug, Default)]
pub struct Inbox {
    slots: HashMap<MessageKind, Message>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `message` in the slot for `kind`, returning whatever it replaced.
    pub fn store(&mut self, kind: MessageKind, message: Message) -> Option<Message> {
        let replaced = self.slots.insert(kind, message);
        if replaced.is_some() {
            debug!("Inbox slot {kind} overwritten before it was claimed");
        }
        replaced
    }

    /// Claim the message waiting in the slot for `kind`, if any.
    pub fn take(&mut self, kind: MessageKind) -> Option<Message> {
        self.slots.remove(&kind)
    }

    pub fn contains(&self, kind: MessageKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
