// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::MessageId;
use crate::model::Message;
use crate::store::MessageStore;

/// Single-focus inspection view over one assistant message.
///
/// Only the focused id is kept; the message itself is always read back from
/// the store, so the overlay can never show something outside the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailOverlay {
    focused: Option<MessageId>,
}

impl DetailOverlay {
    /// Focuses `message` when it is an assistant entry of `store`; replaces
    /// any previous focus. Returns whether the focus changed hands.
    pub fn open(&mut self, store: &MessageStore, message: &Message) -> bool {
        if !message.is_assistant() {
            return false;
        }
        if store.get(message.id).is_none_or(|stored| stored != message) {
            return false;
        }
        self.focused = Some(message.id);
        true
    }

    pub fn close(&mut self) {
        self.focused = None;
    }

    pub fn current<'a>(&self, store: &'a MessageStore) -> Option<&'a Message> {
        self.focused.and_then(|id| store.get(id))
    }

    /// Text for the copy action, if anything is focused.
    pub fn copy_text<'a>(&self, store: &'a MessageStore) -> Option<&'a str> {
        self.current(store).map(|message| message.text.as_str())
    }
}
