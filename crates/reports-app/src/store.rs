// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::ids::{MessageId, MessageIdSource};
use crate::model::Message;

/// Append-only conversation timeline.
///
/// Messages are never updated or removed; readers always get the full
/// sequence in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageStore {
    messages: Vec<Message>,
    ids: MessageIdSource,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, created_at: OffsetDateTime) -> MessageId {
        self.ids.next(created_at)
    }

    pub fn append(&mut self, message: Message) {
        tracing::trace!(
            id = message.id.get(),
            sender = message.sender.as_str(),
            "append message"
        );
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn assistant_ids(&self) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|message| message.is_assistant())
            .map(|message| message.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::MessageStore;
    use crate::Message;
    use time::OffsetDateTime;

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = MessageStore::new();
        let now = OffsetDateTime::UNIX_EPOCH;

        let first = store.next_id(now);
        store.append(Message::user(first, "one", now));
        let second = store.next_id(now);
        store.append(Message::welcome(second, now));

        let texts: Vec<&str> = store.all().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], "one");
        assert_eq!(store.last().map(|m| m.id), Some(second));
        assert_eq!(store.get(first).map(|m| m.text.as_str()), Some("one"));
        assert_eq!(store.assistant_ids(), vec![second]);
    }

    #[test]
    fn earlier_entries_are_unchanged_by_later_appends() {
        let mut store = MessageStore::new();
        let now = OffsetDateTime::UNIX_EPOCH;
        let id = store.next_id(now);
        store.append(Message::user(id, "first", now));
        let snapshot = store.all().to_vec();

        for text in ["a", "b", "c"] {
            let id = store.next_id(now);
            store.append(Message::user(id, text, now));
        }

        assert_eq!(store.len(), 4);
        assert_eq!(&store.all()[..1], snapshot.as_slice());
    }
}
