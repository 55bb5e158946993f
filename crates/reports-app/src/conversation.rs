// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::dispatch::{Admission, Dispatcher, QueryOutcome};
use crate::ids::{MessageId, RequestId};
use crate::model::Message;
use crate::overlay::DetailOverlay;
use crate::store::MessageStore;

/// Timeline, dispatcher, and detail overlay of one chat session.
///
/// The store is only written through [`Conversation::submit`] and
/// [`Conversation::complete`]; the overlay only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    store: MessageStore,
    dispatcher: Dispatcher,
    overlay: DetailOverlay,
    welcome: Option<MessageId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_welcome(now: OffsetDateTime) -> Self {
        let mut conversation = Self::new();
        let id = conversation.store.next_id(now);
        conversation.store.append(Message::welcome(id, now));
        conversation.welcome = Some(id);
        conversation
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    /// Number of entries excluding the welcome greeting.
    pub fn exchange_count(&self) -> usize {
        self.messages()
            .iter()
            .filter(|message| Some(message.id) != self.welcome)
            .count()
    }

    pub fn is_loading(&self) -> bool {
        self.dispatcher.is_in_flight()
    }

    pub fn submit(&mut self, query: &str, now: OffsetDateTime) -> Admission {
        self.dispatcher.submit(&mut self.store, query, now)
    }

    pub fn complete(
        &mut self,
        request_id: RequestId,
        outcome: QueryOutcome,
        now: OffsetDateTime,
    ) -> Option<MessageId> {
        self.dispatcher
            .settle(&mut self.store, request_id, outcome, now)
    }

    pub fn open_detail(&mut self, id: MessageId) -> bool {
        match self.store.get(id) {
            Some(message) => self.overlay.open(&self.store, message),
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.overlay.close();
    }

    pub fn detail(&self) -> Option<&Message> {
        self.overlay.current(&self.store)
    }

    pub fn detail_copy_text(&self) -> Option<&str> {
        self.overlay.copy_text(&self.store)
    }
}
