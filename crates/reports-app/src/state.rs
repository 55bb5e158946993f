// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::conversation::Conversation;
use crate::dispatch::{Admission, PendingQuery, QueryOutcome, Rejection};
use crate::ids::{MessageId, RequestId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub conversation: Conversation,
    pub input: String,
    pub selected: Option<MessageId>,
    pub help_visible: bool,
    pub status_line: Option<String>,
    /// First visible line of the detail overlay.
    pub detail_scroll: usize,
    /// First visible timeline line once the user scrolls by hand. `None`
    /// follows the newest entry, or the selection when there is one.
    pub timeline_scroll: Option<usize>,
}

/// A move within a scrolled view. Offsets count rendered lines from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMove {
    By(isize),
    Top,
    Bottom,
}

impl ScrollMove {
    pub fn apply(self, current: usize, max_offset: usize) -> usize {
        match self {
            Self::By(delta) => current
                .min(max_offset)
                .saturating_add_signed(delta)
                .min(max_offset),
            Self::Top => 0,
            Self::Bottom => max_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    InsertChar(char),
    DeleteChar,
    ClearInput,
    Submit,
    Complete {
        request_id: RequestId,
        outcome: QueryOutcome,
    },
    SelectPrevious,
    SelectNext,
    ScrollTimeline {
        movement: ScrollMove,
        from: usize,
        max_offset: usize,
    },
    ScrollDetail {
        movement: ScrollMove,
        max_offset: usize,
    },
    OpenDetail,
    CloseDetail,
    ToggleHelp,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    InputChanged,
    QueryAccepted(PendingQuery),
    QueryRejected(Rejection),
    MessageAppended(MessageId),
    SelectionChanged(Option<MessageId>),
    TimelineScrolled(usize),
    DetailScrolled(usize),
    DetailOpened(MessageId),
    DetailClosed,
    HelpToggled(bool),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand, now: OffsetDateTime) -> Vec<AppEvent> {
        match command {
            AppCommand::InsertChar(ch) => {
                self.input.push(ch);
                vec![AppEvent::InputChanged]
            }
            AppCommand::DeleteChar => {
                if self.input.pop().is_some() {
                    vec![AppEvent::InputChanged]
                } else {
                    Vec::new()
                }
            }
            AppCommand::ClearInput => {
                if self.input.is_empty() {
                    return Vec::new();
                }
                self.input.clear();
                vec![AppEvent::InputChanged]
            }
            AppCommand::Submit => self.submit(now),
            AppCommand::Complete {
                request_id,
                outcome,
            } => match self.conversation.complete(request_id, outcome, now) {
                Some(id) => {
                    self.timeline_scroll = None;
                    vec![AppEvent::MessageAppended(id)]
                }
                None => Vec::new(),
            },
            AppCommand::SelectPrevious => self.move_selection(-1),
            AppCommand::SelectNext => self.move_selection(1),
            AppCommand::ScrollTimeline {
                movement,
                from,
                max_offset,
            } => {
                let next = movement.apply(from, max_offset);
                if self.timeline_scroll == Some(next) {
                    return Vec::new();
                }
                self.timeline_scroll = Some(next);
                vec![AppEvent::TimelineScrolled(next)]
            }
            AppCommand::ScrollDetail {
                movement,
                max_offset,
            } => {
                if self.conversation.detail().is_none() {
                    return Vec::new();
                }
                let next = movement.apply(self.detail_scroll, max_offset);
                if next == self.detail_scroll {
                    return Vec::new();
                }
                self.detail_scroll = next;
                vec![AppEvent::DetailScrolled(next)]
            }
            AppCommand::OpenDetail => self.open_detail(),
            AppCommand::CloseDetail => {
                if self.conversation.detail().is_none() {
                    return Vec::new();
                }
                self.conversation.close_detail();
                self.detail_scroll = 0;
                vec![AppEvent::DetailClosed]
            }
            AppCommand::ToggleHelp => {
                self.help_visible = !self.help_visible;
                vec![AppEvent::HelpToggled(self.help_visible)]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn submit(&mut self, now: OffsetDateTime) -> Vec<AppEvent> {
        let query = self.input.clone();
        match self.conversation.submit(&query, now) {
            Admission::Accepted(pending) => {
                self.input.clear();
                self.selected = None;
                self.timeline_scroll = None;
                let appended = self
                    .conversation
                    .messages()
                    .last()
                    .map(|message| message.id);
                let mut events = vec![AppEvent::InputChanged];
                events.extend(appended.map(AppEvent::MessageAppended));
                events.push(AppEvent::QueryAccepted(pending));
                events
            }
            Admission::Rejected(Rejection::EmptyQuery) => {
                vec![AppEvent::QueryRejected(Rejection::EmptyQuery)]
            }
            Admission::Rejected(Rejection::Busy) => vec![
                AppEvent::QueryRejected(Rejection::Busy),
                self.set_status(Rejection::Busy.label()),
            ],
        }
    }

    /// Moves the timeline cursor across assistant entries. With nothing
    /// selected, either direction starts from the newest reply.
    fn move_selection(&mut self, delta: isize) -> Vec<AppEvent> {
        let ids = self.conversation.store().assistant_ids();
        if ids.is_empty() {
            return Vec::new();
        }

        let next = match self
            .selected
            .and_then(|id| ids.iter().position(|candidate| *candidate == id))
        {
            None => ids.len() - 1,
            Some(current) => {
                let last = ids.len() as isize - 1;
                (current as isize + delta).clamp(0, last) as usize
            }
        };
        let selected = Some(ids[next]);
        if selected == self.selected {
            return Vec::new();
        }
        self.selected = selected;
        self.timeline_scroll = None;
        vec![AppEvent::SelectionChanged(selected)]
    }

    fn open_detail(&mut self) -> Vec<AppEvent> {
        let target = self
            .selected
            .or_else(|| self.conversation.store().assistant_ids().last().copied());
        let Some(id) = target else {
            return Vec::new();
        };
        if self.conversation.open_detail(id) {
            self.detail_scroll = 0;
            vec![AppEvent::DetailOpened(id)]
        } else {
            Vec::new()
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
