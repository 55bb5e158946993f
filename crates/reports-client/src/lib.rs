// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reports_app::ChatReply;
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const CHAT_PATH: &str = "/chat";

/// Blocking client for the assistant backend.
///
/// Cheap to clone; clones share the underlying connection pool, so the
/// runtime can hand one to each worker thread.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        validate_base_url(&base_url)?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_url(&self) -> String {
        format!("{}{CHAT_PATH}", self.base_url)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes the backend root endpoint. Only used for startup checks.
    pub fn health(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    /// Sends one query and decodes the reply.
    ///
    /// Any non-2xx status and any body that is not a JSON object is an error;
    /// callers decide how failures show up in the timeline.
    pub fn chat(&self, query: &str) -> Result<ChatReply> {
        let url = self.chat_url();
        tracing::debug!(%url, query_len = query.len(), "sending chat query");

        let response = self
            .http
            .post(&url)
            .json(&ChatRequest { query })
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        let body = response.text().context("read chat response body")?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat endpoint returned an error");
            return Err(clean_error_response(status, &body));
        }

        let reply: ChatReply = serde_json::from_str(&body).with_context(|| {
            format!(
                "decode chat response (status {}, body {:?})",
                status.as_u16(),
                preview(&body)
            )
        })?;
        tracing::debug!(
            agent = reply.agent.as_deref().unwrap_or(""),
            response_type = reply.response_type.as_deref().unwrap_or(""),
            "chat reply decoded"
        );
        Ok(reply)
    }
}

/// Checks that `base_url` is an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url).with_context(|| {
        format!("backend.base_url {base_url:?} is not a valid URL (for example http://localhost:8000)")
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(anyhow!(
            "backend.base_url {base_url:?} uses unsupported scheme {scheme:?}; use http or https"
        )),
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("backend at {base_url} timed out ({error})");
    }
    anyhow!(
        "cannot reach backend at {} -- is the API server running? ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail
        && let Some(text) = detail.as_str().filter(|text| !text.is_empty())
    {
        return anyhow!("server error ({}): {}", status.as_u16(), text);
    }

    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return match parsed.error.filter(|error| !error.is_empty()) {
            Some(error) => anyhow!("server error ({}): {}: {}", status.as_u16(), message, error),
            None => anyhow!("server error ({}): {}", status.as_u16(), message),
        };
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 120;
    if body.chars().count() <= LIMIT {
        return body.to_owned();
    }
    let cut: String = body.chars().take(LIMIT).collect();
    format!("{cut}…")
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<serde_json::Value>,
}

/// Error body of the frontend proxy route.
#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Option<String>,
    error: Option<String>,
}
