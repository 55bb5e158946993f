// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::ids::MessageId;
use crate::table::TableData;

pub const DEFAULT_ANSWER: &str = "I apologize, but I couldn't process your request.";
pub const DEFAULT_AGENT: &str = "AI Assistant";
pub const DEFAULT_REASONING: &str = "Response generated";

pub const FAILURE_TEXT: &str = "Sorry, I encountered an error. Please try again.";
pub const FAILURE_AGENT: &str = "Error Handler";
pub const FAILURE_REASONING: &str = "Error occurred during processing";

pub const WELCOME_TEXT: &str =
    "Hello! I'm your AI Reports Assistant. Ask me anything about your documents!";
pub const WELCOME_AGENT: &str = "Welcome";
pub const WELCOME_REASONING: &str = "Initial greeting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Table,
}

impl ResponseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

/// Payload of a message. Table data only exists for table responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text,
    Table(TableData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub agent: Option<String>,
    pub reasoning: Option<String>,
    pub content: MessageContent,
}

impl Message {
    pub fn user(id: MessageId, text: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            created_at,
            agent: None,
            reasoning: None,
            content: MessageContent::Text,
        }
    }

    pub fn welcome(id: MessageId, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: WELCOME_TEXT.to_owned(),
            created_at,
            agent: Some(WELCOME_AGENT.to_owned()),
            reasoning: Some(WELCOME_REASONING.to_owned()),
            content: MessageContent::Text,
        }
    }

    pub const fn is_assistant(&self) -> bool {
        matches!(self.sender, Sender::Assistant)
    }

    pub const fn response_kind(&self) -> ResponseKind {
        match self.content {
            MessageContent::Text => ResponseKind::Text,
            MessageContent::Table(_) => ResponseKind::Table,
        }
    }

    pub const fn table_data(&self) -> Option<&TableData> {
        match &self.content {
            MessageContent::Text => None,
            MessageContent::Table(data) => Some(data),
        }
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.created_at)
    }
}

/// Backend reply as received. Every field may be missing; see
/// [`crate::normalize_reply`] for the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub answer: Option<String>,
    pub agent: Option<String>,
    pub reasoning: Option<String>,
    pub response_type: Option<String>,
    pub table_data: Option<TableData>,
}

pub fn format_clock(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| "--:--".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{ChatReply, Message, ResponseKind, Sender, format_clock};
    use crate::{MessageContent, MessageId, TableData};
    use time::{Duration, OffsetDateTime};

    #[test]
    fn response_kind_parse_only_knows_text_and_table() {
        assert_eq!(ResponseKind::parse("table"), Some(ResponseKind::Table));
        assert_eq!(ResponseKind::parse("text"), Some(ResponseKind::Text));
        assert_eq!(ResponseKind::parse("chart"), None);
        assert_eq!(ResponseKind::parse(""), None);
        for kind in [ResponseKind::Text, ResponseKind::Table] {
            assert_eq!(ResponseKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn user_message_has_no_assistant_metadata() {
        let message = Message::user(MessageId::new(1), "hi", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(message.sender, Sender::User);
        assert!(!message.is_assistant());
        assert!(message.agent.is_none());
        assert!(message.reasoning.is_none());
        assert_eq!(message.response_kind(), ResponseKind::Text);
        assert!(message.table_data().is_none());
    }

    #[test]
    fn table_content_exposes_table_data() {
        let message = Message {
            content: MessageContent::Table(TableData::default()),
            ..Message::welcome(MessageId::new(2), OffsetDateTime::UNIX_EPOCH)
        };
        assert_eq!(message.response_kind(), ResponseKind::Table);
        assert_eq!(message.table_data(), Some(&TableData::default()));
    }

    #[test]
    fn clock_uses_24_hour_minutes() {
        let at = OffsetDateTime::UNIX_EPOCH + Duration::hours(15) + Duration::minutes(7);
        assert_eq!(format_clock(at), "15:07");
    }

    #[test]
    fn chat_reply_tolerates_missing_fields() -> serde_json::Result<()> {
        let reply: ChatReply = serde_json::from_str(r#"{"answer":"1.2M"}"#)?;
        assert_eq!(reply.answer.as_deref(), Some("1.2M"));
        assert!(reply.agent.is_none());
        assert!(reply.table_data.is_none());

        let reply: ChatReply = serde_json::from_str(r#"{"answer":"x","table_data":null}"#)?;
        assert!(reply.table_data.is_none());
        Ok(())
    }
}
