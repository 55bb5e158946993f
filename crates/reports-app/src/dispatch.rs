// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::ids::{MessageId, RequestId};
use crate::model::{
    ChatReply, DEFAULT_AGENT, DEFAULT_ANSWER, DEFAULT_REASONING, FAILURE_AGENT,
    FAILURE_REASONING, FAILURE_TEXT, Message, MessageContent, ResponseKind, Sender,
};
use crate::store::MessageStore;

/// Work handed to the transport after a submission is admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub request_id: RequestId,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyQuery,
    Busy,
}

impl Rejection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty query",
            Self::Busy => "still waiting for the previous answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted(PendingQuery),
    Rejected(Rejection),
}

/// How a backend call ended. The error text is for logs only; the timeline
/// always shows the fixed failure message.
pub type QueryOutcome = Result<ChatReply, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatcher {
    /// The single in-flight slot. While it holds a request id, a backend
    /// call is outstanding and further submissions are refused.
    in_flight: Option<RequestId>,
    next_request_id: i64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn submit(
        &mut self,
        store: &mut MessageStore,
        query: &str,
        now: OffsetDateTime,
    ) -> Admission {
        if query.trim().is_empty() {
            return Admission::Rejected(Rejection::EmptyQuery);
        }
        if let Some(in_flight) = self.in_flight {
            tracing::debug!(
                request_id = in_flight.get(),
                "submission rejected while in flight"
            );
            return Admission::Rejected(Rejection::Busy);
        }

        let query_id = store.next_id(now);
        store.append(Message::user(query_id, query, now));

        let request_id = self.next_request_id();
        self.in_flight = Some(request_id);
        tracing::debug!(request_id = request_id.get(), "query admitted");

        Admission::Accepted(PendingQuery {
            request_id,
            query: query.to_owned(),
        })
    }

    /// Records the end of the outstanding call and appends its assistant
    /// message. Settlements for any other request id are ignored.
    pub fn settle(
        &mut self,
        store: &mut MessageStore,
        request_id: RequestId,
        outcome: QueryOutcome,
        now: OffsetDateTime,
    ) -> Option<MessageId> {
        let in_flight = self.in_flight?;
        if in_flight != request_id {
            tracing::warn!(
                expected = in_flight.get(),
                got = request_id.get(),
                "ignoring settlement for unknown request"
            );
            return None;
        }
        self.in_flight = None;

        let id = store.next_id(now);
        let message = match outcome {
            Ok(reply) => normalize_reply(id, reply, now),
            Err(error) => {
                tracing::warn!(request_id = request_id.get(), %error, "query failed");
                failure_message(id, now)
            }
        };
        tracing::debug!(
            request_id = request_id.get(),
            kind = message.response_kind().as_str(),
            "reply appended"
        );
        store.append(message);
        Some(id)
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request_id = self.next_request_id.saturating_add(1);
        RequestId::new(self.next_request_id)
    }
}

/// Turns a possibly partial reply into a complete assistant message.
///
/// Absent and empty fields take their defaults. Table data is only kept for
/// table responses; a table response without table data carries an empty
/// payload, which renders as an empty raw block.
pub fn normalize_reply(id: MessageId, reply: ChatReply, created_at: OffsetDateTime) -> Message {
    let kind = non_empty(reply.response_type)
        .as_deref()
        .and_then(ResponseKind::parse)
        .unwrap_or(ResponseKind::Text);
    let content = match kind {
        ResponseKind::Text => MessageContent::Text,
        ResponseKind::Table => MessageContent::Table(reply.table_data.unwrap_or_default()),
    };

    Message {
        id,
        sender: Sender::Assistant,
        text: non_empty(reply.answer).unwrap_or_else(|| DEFAULT_ANSWER.to_owned()),
        created_at,
        agent: Some(non_empty(reply.agent).unwrap_or_else(|| DEFAULT_AGENT.to_owned())),
        reasoning: Some(
            non_empty(reply.reasoning).unwrap_or_else(|| DEFAULT_REASONING.to_owned()),
        ),
        content,
    }
}

pub fn failure_message(id: MessageId, created_at: OffsetDateTime) -> Message {
    Message {
        id,
        sender: Sender::Assistant,
        text: FAILURE_TEXT.to_owned(),
        created_at,
        agent: Some(FAILURE_AGENT.to_owned()),
        reasoning: Some(FAILURE_REASONING.to_owned()),
        content: MessageContent::Text,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Admission, Dispatcher, Rejection, failure_message, normalize_reply};
    use crate::{
        ChatReply, DEFAULT_AGENT, DEFAULT_ANSWER, DEFAULT_REASONING, FAILURE_AGENT, FAILURE_TEXT,
        MessageId, MessageStore, RenderPlan, RequestId, ResponseKind, Sender, TableData,
    };
    use time::OffsetDateTime;

    fn now() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }

    fn accepted(admission: Admission) -> super::PendingQuery {
        match admission {
            Admission::Accepted(pending) => pending,
            Admission::Rejected(reason) => panic!("expected admission, got {reason:?}"),
        }
    }

    #[test]
    fn submit_appends_user_message_and_takes_slot() {
        let mut store = MessageStore::new();
        let mut dispatcher = Dispatcher::new();

        let pending = accepted(dispatcher.submit(&mut store, "What is revenue?", now()));
        assert_eq!(pending.query, "What is revenue?");
        assert!(dispatcher.is_in_flight());
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].sender, Sender::User);
        assert_eq!(store.all()[0].text, "What is revenue?");
    }

    #[test]
    fn blank_query_is_rejected_without_side_effects() {
        let mut store = MessageStore::new();
        let mut dispatcher = Dispatcher::new();

        assert_eq!(
            dispatcher.submit(&mut store, "   \t", now()),
            Admission::Rejected(Rejection::EmptyQuery)
        );
        assert!(store.is_empty());
        assert!(!dispatcher.is_in_flight());
    }

    #[test]
    fn submit_while_in_flight_is_a_no_op() {
        let mut store = MessageStore::new();
        let mut dispatcher = Dispatcher::new();
        let first = accepted(dispatcher.submit(&mut store, "first", now()));

        assert_eq!(
            dispatcher.submit(&mut store, "second", now()),
            Admission::Rejected(Rejection::Busy)
        );
        assert_eq!(store.len(), 1);
        assert!(
            dispatcher
                .settle(&mut store, first.request_id, Ok(ChatReply::default()), now())
                .is_some()
        );
    }

    #[test]
    fn success_and_failure_each_release_the_slot() {
        let mut store = MessageStore::new();
        let mut dispatcher = Dispatcher::new();

        let first = accepted(dispatcher.submit(&mut store, "one", now()));
        dispatcher.settle(
            &mut store,
            first.request_id,
            Ok(ChatReply::default()),
            now(),
        );
        assert!(!dispatcher.is_in_flight());

        let second = accepted(dispatcher.submit(&mut store, "two", now()));
        dispatcher.settle(
            &mut store,
            second.request_id,
            Err("connection refused".to_owned()),
            now(),
        );
        assert!(!dispatcher.is_in_flight());

        accepted(dispatcher.submit(&mut store, "three", now()));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn each_settlement_appends_exactly_one_assistant_message() {
        let mut store = MessageStore::new();
        let mut dispatcher = Dispatcher::new();
        let outcomes = [
            Ok(ChatReply::default()),
            Err("500".to_owned()),
            Ok(ChatReply {
                answer: Some("ok".to_owned()),
                ..ChatReply::default()
            }),
        ];

        for (index, outcome) in outcomes.into_iter().enumerate() {
            let before = store.len();
            let pending = accepted(dispatcher.submit(&mut store, &format!("q{index}"), now()));
            dispatcher.settle(&mut store, pending.request_id, outcome, now());

            let added = &store.all()[before..];
            assert_eq!(added.len(), 2);
            assert_eq!(added[0].sender, Sender::User);
            assert_eq!(added[1].sender, Sender::Assistant);
        }
    }

    #[test]
    fn settlement_for_another_request_is_ignored() {
        let mut store = MessageStore::new();
        let mut dispatcher = Dispatcher::new();
        let pending = accepted(dispatcher.submit(&mut store, "q", now()));

        let stale = RequestId::new(pending.request_id.get() + 10);
        assert!(
            dispatcher
                .settle(&mut store, stale, Ok(ChatReply::default()), now())
                .is_none()
        );
        assert!(dispatcher.is_in_flight());
        assert_eq!(store.len(), 1);

        assert!(
            dispatcher
                .settle(&mut store, pending.request_id, Ok(ChatReply::default()), now())
                .is_some()
        );
        assert!(
            dispatcher
                .settle(&mut store, pending.request_id, Ok(ChatReply::default()), now())
                .is_none()
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn normalize_fills_defaults() {
        let message = normalize_reply(MessageId::new(1), ChatReply::default(), now());
        assert_eq!(message.text, DEFAULT_ANSWER);
        assert_eq!(message.agent.as_deref(), Some(DEFAULT_AGENT));
        assert_eq!(message.reasoning.as_deref(), Some(DEFAULT_REASONING));
        assert_eq!(message.response_kind(), ResponseKind::Text);
        assert!(message.table_data().is_none());
    }

    #[test]
    fn normalize_treats_empty_strings_as_missing() {
        let message = normalize_reply(
            MessageId::new(1),
            ChatReply {
                answer: Some(String::new()),
                agent: Some(String::new()),
                reasoning: Some(String::new()),
                response_type: Some(String::new()),
                table_data: None,
            },
            now(),
        );
        assert_eq!(message.text, DEFAULT_ANSWER);
        assert_eq!(message.agent.as_deref(), Some(DEFAULT_AGENT));
        assert_eq!(message.reasoning.as_deref(), Some(DEFAULT_REASONING));
    }

    #[test]
    fn normalize_drops_table_data_for_text_replies() {
        let message = normalize_reply(
            MessageId::new(1),
            ChatReply {
                response_type: Some("text".to_owned()),
                table_data: Some(TableData {
                    raw_content: Some("stale".to_owned()),
                    ..TableData::default()
                }),
                ..ChatReply::default()
            },
            now(),
        );
        assert!(message.table_data().is_none());
    }

    #[test]
    fn normalize_keeps_table_data_for_table_replies() {
        let message = normalize_reply(
            MessageId::new(1),
            ChatReply {
                answer: Some("see table".to_owned()),
                response_type: Some("table".to_owned()),
                ..ChatReply::default()
            },
            now(),
        );
        assert_eq!(message.response_kind(), ResponseKind::Table);
        let data = message.table_data().expect("table reply should carry data");
        assert_eq!(data.plan(), RenderPlan::RawBlock(None));
    }

    #[test]
    fn unknown_response_type_defaults_to_text() {
        let message = normalize_reply(
            MessageId::new(1),
            ChatReply {
                response_type: Some("chart".to_owned()),
                table_data: Some(TableData::default()),
                ..ChatReply::default()
            },
            now(),
        );
        assert_eq!(message.response_kind(), ResponseKind::Text);
    }

    #[test]
    fn failure_message_is_fixed() {
        let message = failure_message(MessageId::new(9), now());
        assert_eq!(message.text, FAILURE_TEXT);
        assert_eq!(message.agent.as_deref(), Some(FAILURE_AGENT));
        assert_eq!(message.response_kind(), ResponseKind::Text);
        assert!(message.is_assistant());
    }
}
