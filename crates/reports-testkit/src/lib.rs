// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

/// Address nothing listens on; connections are refused immediately.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:1";

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).map_err(|error| anyhow!("decode request body: {error}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json",
            delay: None,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain",
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A one-shot HTTP backend that answers requests with canned responses, in
/// order, and records what it received.
///
/// The server thread stops after the last response, or after sitting idle
/// for a few seconds so a test that sends fewer requests cannot hang.
pub struct MockBackend {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockBackend {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for canned in responses {
                let mut request = match server.recv_timeout(IDLE_TIMEOUT) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => return,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                if let Ok(mut log) = recorded.lock() {
                    log.push(RecordedRequest {
                        method: request.method().to_string(),
                        url: request.url().to_owned(),
                        body,
                    });
                }

                if let Some(delay) = canned.delay {
                    thread::sleep(delay);
                }

                let mut response =
                    Response::from_string(canned.body).with_status_code(canned.status);
                if let Ok(header) = Header::from_bytes("Content-Type", canned.content_type) {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Ok(Self {
            base_url,
            requests,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        match self.requests.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Waits for the server thread and returns every recorded request.
    pub fn finish(mut self) -> Result<Vec<RecordedRequest>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("mock server thread panicked"))?;
        }
        Ok(self.requests())
    }
}

pub fn text_reply(answer: &str, agent: &str) -> String {
    json!({
        "answer": answer,
        "agent": agent,
        "reasoning": "Matched the question against indexed reports",
        "response_type": "text",
    })
    .to_string()
}

pub fn table_reply() -> String {
    json!({
        "answer": "Quarterly revenue is summarized below.",
        "agent": "TableQA",
        "reasoning": "Extracted the revenue table from the Q3 report",
        "response_type": "table",
        "table_data": {
            "parsed_tables": [
                {
                    "type": "financial",
                    "headers": ["Quarter", "Revenue", "Growth"],
                    "rows": [
                        {"Quarter": "Q1", "Revenue": "1.0M", "Growth": "4%"},
                        {"Quarter": "Q2", "Revenue": "1.1M"},
                        {"Quarter": "Q3", "Revenue": 1200000, "Growth": "9%"},
                    ],
                },
            ],
        },
    })
    .to_string()
}

pub fn table_error_reply() -> String {
    json!({
        "answer": "I could not extract a table, but revenue grew 9% in Q3.",
        "agent": "TableQA",
        "response_type": "table",
        "table_data": {"error": true},
    })
    .to_string()
}

pub fn raw_table_reply(raw: &str) -> String {
    json!({
        "answer": "Here is the table as extracted.",
        "agent": "TableQA",
        "response_type": "table",
        "table_data": {"raw_content": raw},
    })
    .to_string()
}

pub fn write_temp_file(name: &str, content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join(name);
    std::fs::write(&path, content)?;
    Ok((temp, path))
}

#[cfg(test)]
mod tests {
    use super::{MockBackend, MockResponse, table_reply, text_reply};
    use anyhow::Result;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    #[test]
    fn fixtures_are_valid_json() -> Result<()> {
        let text: serde_json::Value = serde_json::from_str(&text_reply("1.2M", "Finance"))?;
        assert_eq!(text["answer"], "1.2M");
        let table: serde_json::Value = serde_json::from_str(&table_reply())?;
        assert_eq!(table["table_data"]["parsed_tables"][0]["headers"][0], "Quarter");
        Ok(())
    }

    #[test]
    fn mock_backend_records_requests() -> Result<()> {
        let backend = MockBackend::start(vec![MockResponse::json(200, "{}")])?;
        let address = backend.base_url().trim_start_matches("http://").to_owned();

        let mut stream = TcpStream::connect(&address)?;
        let body = r#"{"query":"hi"}"#;
        write!(
            stream,
            "POST /chat HTTP/1.1\r\nHost: {address}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )?;
        let mut response = String::new();
        stream.read_to_string(&mut response)?;
        assert!(response.starts_with("HTTP/1.1 200"));

        let requests = backend.finish()?;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].url, "/chat");
        assert_eq!(requests[0].json_body()?["query"], "hi");
        Ok(())
    }
}
