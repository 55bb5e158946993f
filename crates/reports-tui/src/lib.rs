// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use reports_app::{
    AppCommand, AppEvent, AppState, ChatReply, DEFAULT_AGENT, Message, QueryOutcome,
    RenderPlan, RequestId, ResponseKind, ScrollMove, Sender as Author, TABLE_UNAVAILABLE_DETAIL,
    TABLE_UNAVAILABLE_TITLE, Table, TableData,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};
use unicode_width::UnicodeWidthStr;

const APP_TITLE: &str = "AI REPORTS ASSISTANT";
const TAGLINE: &str = "Your intelligent document analysis companion";
const READY_BADGE: &str = "● Ready to assist";
const THINKING_BADGE: &str = "◌ Thinking…";
const THINKING_TEXT: &str = "Analyzing your request…";
const RAW_TABLE_TITLE: &str = "Raw Table Data";
const TABLE_TITLE: &str = "📊 Data Table";
const PARSED_OK: &str = "✓ Parsed successfully";
const PROCESS_FLOW: &str = "Query → Analysis → Response";
const REQUEST_FAILED_STATUS: &str = "request failed";
const IDLE_HINT: &str =
    "enter send | up/down select | pgup/pgdn scroll | ctrl+o details | f1 help | ctrl+q quit";
const BODY_INDENT: &str = "    ";

pub const DEFAULT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    Completed {
        request_id: RequestId,
        reply: ChatReply,
    },
    Failed {
        request_id: RequestId,
        error: String,
    },
}

impl QueryEvent {
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Completed { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }

    fn into_outcome(self) -> QueryOutcome {
        match self {
            Self::Completed { reply, .. } => Ok(reply),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Query(QueryEvent),
}

/// Everything the screen needs from the outside world.
pub trait ChatRuntime {
    fn send_query(&mut self, query: &str) -> Result<ChatReply>;

    /// Starts a backend call whose result must arrive on `tx` as exactly one
    /// [`QueryEvent`]. The default runs the call inline.
    fn spawn_query(
        &mut self,
        request_id: RequestId,
        query: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = match self.send_query(query) {
            Ok(reply) => QueryEvent::Completed { request_id, reply },
            Err(error) => QueryEvent::Failed {
                request_id,
                error: format!("{error:#}"),
            },
        };
        tx.send(InternalEvent::Query(event))
            .map_err(|_| anyhow!("query event channel closed"))?;
        Ok(())
    }

    fn copy_text(&mut self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub history_limit: usize,
    /// Offset used to stamp new messages; resolved once at startup.
    pub clock_offset: UtcOffset,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            clock_offset: UtcOffset::UTC,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    options: UiOptions,
    status_token: u64,
    /// Terminal size at the last frame; scroll keys page by it.
    viewport: Rect,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            options,
            status_token: 0,
            viewport: Rect::default(),
        }
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.options.clock_offset)
    }
}

pub fn run_app<R: ChatRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();
    tracing::info!(
        history_limit = options.history_limit,
        "conversation screen started"
    );

    let result = event_loop(
        &mut terminal,
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        &internal_rx,
    );

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: ChatRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) -> Result<()> {
    loop {
        process_internal_events(state, view_data, internal_tx, internal_rx);

        let size = terminal.size().context("read terminal size")?;
        view_data.viewport = Rect::new(0, 0, size.width, size.height);
        terminal
            .draw(|frame| render(frame, state, view_data))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key_event(state, runtime, view_data, internal_tx, key) {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus, view_data.now());
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Query(event) => {
                let request_id = event.request_id();
                tracing::debug!(request_id = request_id.get(), "query result received");
                settle(state, view_data, tx, request_id, event.into_outcome());
            }
        }
    }
}

/// Applies a finished call. Late events for an older request are dropped.
fn settle(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request_id: RequestId,
    outcome: QueryOutcome,
) {
    let failed = outcome.is_err();
    let events = state.dispatch(
        AppCommand::Complete {
            request_id,
            outcome,
        },
        view_data.now(),
    );
    if !events.is_empty() && failed {
        emit_status(state, view_data, tx, REQUEST_FAILED_STATUS);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()), view_data.now());
    bump_status_token(view_data, internal_tx);
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: ChatRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        return true;
    }

    if key.code == KeyCode::F(1) {
        state.dispatch(AppCommand::ToggleHelp, view_data.now());
        return false;
    }

    if state.help_visible {
        if key.code == KeyCode::Esc {
            state.dispatch(AppCommand::ToggleHelp, view_data.now());
        }
        return false;
    }

    if state.conversation.detail().is_some() {
        handle_detail_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    let now = view_data.now();
    match key.code {
        KeyCode::Enter if state.input.trim().is_empty() && state.selected.is_some() => {
            open_detail(state, view_data, internal_tx);
        }
        KeyCode::Enter => submit_query(state, runtime, view_data, internal_tx),
        KeyCode::Char('o') if ctrl => open_detail(state, view_data, internal_tx),
        KeyCode::Char('u') if ctrl => {
            state.dispatch(AppCommand::ClearInput, now);
        }
        KeyCode::Backspace => {
            state.dispatch(AppCommand::DeleteChar, now);
        }
        KeyCode::Up => {
            state.dispatch(AppCommand::SelectPrevious, now);
        }
        KeyCode::Down => {
            state.dispatch(AppCommand::SelectNext, now);
        }
        KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home | KeyCode::End => {
            scroll_timeline(state, view_data, key.code);
        }
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            state.dispatch(AppCommand::InsertChar(ch), now);
        }
        _ => {}
    }
    false
}

fn handle_detail_key<R: ChatRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::CloseDetail, view_data.now());
        }
        KeyCode::Char('c') if !ctrl => copy_detail(state, runtime, view_data, internal_tx),
        KeyCode::Char('y') if ctrl => copy_detail(state, runtime, view_data, internal_tx),
        code => scroll_detail(state, view_data, code),
    }
}

fn scroll_move_for_key(code: KeyCode, height: usize) -> Option<ScrollMove> {
    let page = isize::try_from(height.saturating_sub(1).max(1)).unwrap_or(isize::MAX);
    match code {
        KeyCode::Up => Some(ScrollMove::By(-1)),
        KeyCode::Down => Some(ScrollMove::By(1)),
        KeyCode::PageUp => Some(ScrollMove::By(-page)),
        KeyCode::PageDown => Some(ScrollMove::By(page)),
        KeyCode::Home => Some(ScrollMove::Top),
        KeyCode::End => Some(ScrollMove::Bottom),
        _ => None,
    }
}

fn scroll_timeline(state: &mut AppState, view_data: &ViewData, code: KeyCode) {
    let (timeline, height) = timeline_view(state, view_data);
    let Some(movement) = scroll_move_for_key(code, height) else {
        return;
    };
    let from = timeline.offset(state.timeline_scroll, height);
    state.dispatch(
        AppCommand::ScrollTimeline {
            movement,
            from,
            max_offset: timeline.max_offset(height),
        },
        view_data.now(),
    );
}

fn scroll_detail(state: &mut AppState, view_data: &ViewData, code: KeyCode) {
    let Some((lines, height)) = state
        .conversation
        .detail()
        .map(|message| detail_view(message, view_data.viewport))
    else {
        return;
    };
    let Some(movement) = scroll_move_for_key(code, height) else {
        return;
    };
    state.dispatch(
        AppCommand::ScrollDetail {
            movement,
            max_offset: lines.len().saturating_sub(height),
        },
        view_data.now(),
    );
}

fn submit_query<R: ChatRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(AppCommand::Submit, view_data.now());
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        bump_status_token(view_data, internal_tx);
    }

    let Some(pending) = events.into_iter().find_map(|event| match event {
        AppEvent::QueryAccepted(pending) => Some(pending),
        _ => None,
    }) else {
        return;
    };

    tracing::info!(
        request_id = pending.request_id.get(),
        query_len = pending.query.len(),
        "query submitted"
    );
    if let Err(error) = runtime.spawn_query(pending.request_id, &pending.query, internal_tx.clone())
    {
        tracing::error!(
            request_id = pending.request_id.get(),
            error = %format!("{error:#}"),
            "could not start query"
        );
        settle(
            state,
            view_data,
            internal_tx,
            pending.request_id,
            Err(error.to_string()),
        );
    }
}

fn open_detail(state: &mut AppState, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    let events = state.dispatch(AppCommand::OpenDetail, view_data.now());
    if events.is_empty() {
        emit_status(state, view_data, internal_tx, "no reply to inspect yet");
    }
}

fn copy_detail<R: ChatRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(text) = state.conversation.detail_copy_text().map(str::to_owned) else {
        return;
    };
    match runtime.copy_text(&text) {
        Ok(()) => emit_status(state, view_data, internal_tx, "copied response to clipboard"),
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "clipboard copy failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("copy failed: {error}"),
            );
        }
    }
}

/// Header, timeline, input, and status rows.
fn screen_areas(area: Rect) -> [Rect; 4] {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area)
}

fn detail_area(area: Rect) -> Rect {
    centered_rect(84, 80, area)
}

/// Width and height inside a bordered block.
fn inner_size(area: Rect) -> (usize, usize) {
    (
        usize::from(area.width.saturating_sub(2)),
        usize::from(area.height.saturating_sub(2)),
    )
}

fn timeline_view(state: &AppState, view_data: &ViewData) -> (TimelineText, usize) {
    let [_, body, _, _] = screen_areas(view_data.viewport);
    let (width, height) = inner_size(body);
    (
        render_timeline(state, view_data.options.history_limit, width),
        height,
    )
}

fn detail_view(message: &Message, viewport: Rect) -> (Vec<String>, usize) {
    let (width, height) = inner_size(detail_area(viewport));
    (detail_overlay_lines(message, width), height)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = screen_areas(frame.area());

    let header = Paragraph::new(header_text(state)).block(
        Block::default()
            .title(APP_TITLE)
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(header, layout[0]);

    let (width, height) = inner_size(layout[1]);
    let timeline = render_timeline(state, view_data.options.history_limit, width);
    let offset = to_u16(timeline.offset(state.timeline_scroll, height));
    let body = Paragraph::new(timeline.lines.join("\n"))
        .scroll((offset, 0))
        .block(Block::default().title("conversation").borders(Borders::ALL));
    frame.render_widget(body, layout[1]);

    let input_title = if state.conversation.is_loading() {
        "ask (waiting for reply)"
    } else {
        "ask"
    };
    let input = Paragraph::new(format!("> {}", state.input))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().title(input_title).borders(Borders::ALL));
    frame.render_widget(input, layout[2]);

    let status = Paragraph::new(status_text(state)).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, layout[3]);

    if let Some(message) = state.conversation.detail() {
        let area = detail_area(frame.area());
        let (lines, height) = detail_view(message, frame.area());
        let offset = state.detail_scroll.min(lines.len().saturating_sub(height));
        let title = if lines.len() > height {
            format!(
                "details {}-{} of {}",
                offset + 1,
                (offset + height).min(lines.len()),
                lines.len()
            )
        } else {
            "details".to_owned()
        };
        frame.render_widget(Clear, area);
        let detail = Paragraph::new(lines.join("\n"))
            .scroll((to_u16(offset), 0))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(detail, area);
    } else if !state.help_visible {
        let typed = to_u16(state.input.width());
        let x = layout[2]
            .x
            .saturating_add(3)
            .saturating_add(typed)
            .min(layout[2].right().saturating_sub(2));
        frame.set_cursor_position((x, layout[2].y.saturating_add(1)));
    }

    if state.help_visible {
        let area = centered_rect(64, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .wrap(Wrap { trim: false })
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(state: &AppState) -> String {
    let badge = if state.conversation.is_loading() {
        THINKING_BADGE
    } else {
        READY_BADGE
    };
    format!(
        "{TAGLINE}\n{badge} | {}",
        plural(state.conversation.exchange_count(), "message")
    )
}

fn status_text(state: &AppState) -> String {
    state
        .status_line
        .clone()
        .unwrap_or_else(|| IDLE_HINT.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TimelineText {
    lines: Vec<String>,
    selected_line: Option<usize>,
}

impl TimelineText {
    fn max_offset(&self, height: usize) -> usize {
        self.lines.len().saturating_sub(height)
    }

    /// First line to show so the newest entry is visible, unless that would
    /// push the selected entry off the top.
    fn scroll_offset(&self, height: usize) -> usize {
        let bottom = self.max_offset(height);
        match self.selected_line {
            Some(line) if line < bottom => line,
            _ => bottom,
        }
    }

    /// A hand-scrolled offset wins over following the conversation.
    fn offset(&self, pinned: Option<usize>, height: usize) -> usize {
        match pinned {
            Some(offset) => offset.min(self.max_offset(height)),
            None => self.scroll_offset(height),
        }
    }
}

fn render_timeline(state: &AppState, history_limit: usize, width: usize) -> TimelineText {
    let messages = state.conversation.messages();
    let hidden = messages.len().saturating_sub(history_limit);
    let body_width = width.saturating_sub(BODY_INDENT.len()).max(1);

    let mut text = TimelineText::default();
    if hidden > 0 {
        text.lines
            .push(format!("  … {} not shown", plural(hidden, "earlier message")));
        text.lines.push(String::new());
    }

    for message in messages.iter().skip(hidden) {
        let selected = state.selected == Some(message.id);
        if selected {
            text.selected_line = Some(text.lines.len());
        }
        let marker = if selected { "▸ " } else { "  " };
        let mut header = format!(
            "{marker}{} · {}",
            author_label(message),
            message.formatted_time()
        );
        if selected {
            header.push_str("  (enter to expand)");
        }
        text.lines.push(header);

        let table_lines = message.table_data().map(table_data_lines);
        let body = message.text.lines().map(str::to_owned).chain(
            table_lines
                .into_iter()
                .flat_map(|lines| std::iter::once(String::new()).chain(lines)),
        );
        for line in body {
            for wrapped in wrap_to_width(&line, body_width) {
                text.lines.push(format!("{BODY_INDENT}{wrapped}"));
            }
        }
        text.lines.push(String::new());
    }

    if state.conversation.is_loading() {
        text.lines.push(format!("  {DEFAULT_AGENT} · {THINKING_TEXT}"));
    }
    text
}

fn author_label(message: &Message) -> &str {
    match message.sender {
        Author::User => "you",
        Author::Assistant => message.agent.as_deref().unwrap_or(DEFAULT_AGENT),
    }
}

fn table_data_lines(data: &TableData) -> Vec<String> {
    match data.plan() {
        RenderPlan::ErrorNotice => vec![
            format!("⚠ {TABLE_UNAVAILABLE_TITLE}"),
            format!("  {TABLE_UNAVAILABLE_DETAIL}"),
        ],
        RenderPlan::ParsedTables(tables) => {
            let mut lines = Vec::new();
            for (index, table) in tables.iter().enumerate() {
                if index > 0 {
                    lines.push(String::new());
                }
                lines.extend(parsed_table_lines(table));
            }
            lines
        }
        RenderPlan::RawBlock(raw) => {
            let mut lines = vec![RAW_TABLE_TITLE.to_owned()];
            if let Some(raw) = raw {
                lines.extend(raw.lines().map(str::to_owned));
            }
            lines
        }
    }
}

fn parsed_table_lines(table: &Table) -> Vec<String> {
    let mut lines = Vec::new();
    let label = table.label();
    if label.is_empty() {
        lines.push(TABLE_TITLE.to_owned());
    } else {
        lines.push(format!("{TABLE_TITLE} · {label}"));
    }

    if !table.headers.is_empty() {
        let mut widths: Vec<usize> = table.headers.iter().map(|header| header.width()).collect();
        for row in &table.rows {
            for (width, cell) in widths.iter_mut().zip(table.row_cells(row)) {
                *width = (*width).max(cell.width());
            }
        }

        lines.push(join_cells(
            table.headers.iter().map(String::as_str),
            &widths,
        ));
        lines.push(
            widths
                .iter()
                .map(|width| "─".repeat(*width))
                .collect::<Vec<_>>()
                .join("─┼─"),
        );
        for row in &table.rows {
            lines.push(join_cells(table.row_cells(row), &widths));
        }
    }

    lines.push(format!("{} · {PARSED_OK}", table.summary()));
    lines
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(cell.width());
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_owned()
}

fn render_detail_overlay_text(message: &Message) -> String {
    let mut lines = vec![
        "AI RESPONSE ANALYSIS".to_owned(),
        format!("{} • {}", author_label(message), message.formatted_time()),
        String::new(),
        "Response Content".to_owned(),
    ];
    lines.extend(message.text.lines().map(|line| format!("  {line}")));

    if let Some(reasoning) = message.reasoning.as_deref() {
        lines.push(String::new());
        lines.push("AI Reasoning".to_owned());
        lines.extend(reasoning.lines().map(|line| format!("  {line}")));
    }

    if message.response_kind() == ResponseKind::Table
        && let Some(data) = message.table_data()
    {
        lines.push(String::new());
        lines.push("Table Visualization".to_owned());
        lines.extend(table_data_lines(data).into_iter().map(|line| format!("  {line}")));
    }

    lines.push(String::new());
    lines.push("Process Flow".to_owned());
    lines.push(format!("  {PROCESS_FLOW}"));
    lines.push(String::new());
    lines.push("up/down pgup/pgdn scroll | c/ctrl+y copy | esc close".to_owned());
    lines.join("\n")
}

fn detail_overlay_lines(message: &Message, width: usize) -> Vec<String> {
    render_detail_overlay_text(message)
        .lines()
        .flat_map(|line| wrap_to_width(line, width))
        .collect()
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q/ctrl+c quit | f1 help\n\
ask: type a question | enter send | backspace delete | ctrl+u clear\n\
timeline: up/down select reply | enter (empty input) or ctrl+o details\n\
timeline: pgup/pgdn scroll | home/end jump to first/last line\n\
details: up/down/pgup/pgdn/home/end scroll | c or ctrl+y copy response | esc close\n\
help: esc or f1 close"
}

/// Wraps to `width` terminal columns. Lines that already fit are kept
/// verbatim so raw blocks and table rows keep their spacing.
fn wrap_to_width(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    if line.width() <= width {
        return vec![line.to_owned()];
    }
    textwrap::wrap(line, width)
        .into_iter()
        .map(|part| part.into_owned())
        .collect()
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
