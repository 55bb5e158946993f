// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use reports_app::{ChatReply, RequestId};
use reports_client::Client;
use reports_tui::{InternalEvent, QueryEvent};
use std::sync::mpsc::Sender;
use std::thread;

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard, opened on first use and then kept alive; some
/// platforms drop the contents when the owning handle goes away.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()
                .map_err(|error| anyhow!("clipboard unavailable: {error}"))?,
        };
        self.inner
            .insert(clipboard)
            .set_text(text)
            .map_err(|error| anyhow!("set clipboard text: {error}"))
    }
}

pub struct HttpRuntime<C = SystemClipboard> {
    client: Client,
    clipboard: C,
}

impl HttpRuntime<SystemClipboard> {
    pub fn new(client: Client) -> Self {
        Self::with_clipboard(client, SystemClipboard::default())
    }
}

impl<C: Clipboard> HttpRuntime<C> {
    pub fn with_clipboard(client: Client, clipboard: C) -> Self {
        Self { client, clipboard }
    }
}

impl<C: Clipboard> reports_tui::ChatRuntime for HttpRuntime<C> {
    fn send_query(&mut self, query: &str) -> Result<ChatReply> {
        self.client.chat(query)
    }

    fn spawn_query(
        &mut self,
        request_id: RequestId,
        query: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let query = query.to_owned();
        thread::Builder::new()
            .name(format!("query-{}", request_id.get()))
            .spawn(move || {
                let reporter = ResultReporter::new(request_id, tx);
                let event = match client.chat(&query) {
                    Ok(reply) => QueryEvent::Completed { request_id, reply },
                    Err(error) => QueryEvent::Failed {
                        request_id,
                        error: format!("{error:#}"),
                    },
                };
                reporter.send(event);
            })
            .context("spawn query worker thread")?;
        Ok(())
    }

    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.set_text(text).inspect_err(|error| {
            tracing::error!(error = %format!("{error:#}"), "copy to clipboard failed");
        })
    }
}

/// Guarantees one result per worker: if the worker unwinds before reporting,
/// the drop sends a failure so the UI releases its in-flight slot.
struct ResultReporter {
    request_id: RequestId,
    tx: Option<Sender<InternalEvent>>,
}

impl ResultReporter {
    fn new(request_id: RequestId, tx: Sender<InternalEvent>) -> Self {
        Self {
            request_id,
            tx: Some(tx),
        }
    }

    fn send(mut self, event: QueryEvent) {
        if let Some(tx) = self.tx.take()
            && tx.send(InternalEvent::Query(event)).is_err()
        {
            tracing::warn!(
                request_id = self.request_id.get(),
                "screen closed before the query finished"
            );
        }
    }
}

impl Drop for ResultReporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            tracing::error!(
                request_id = self.request_id.get(),
                "query worker exited without a result"
            );
            let _ = tx.send(InternalEvent::Query(QueryEvent::Failed {
                request_id: self.request_id,
                error: "query worker exited without a result".to_owned(),
            }));
        }
    }
}
