// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock Messages API endpoint backed by wiremock.
//!
//! `MockUpstream` serves canned replies on `/v1/messages` and records what
//! it received, so tests can assert on the outgoing payload and headers.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock answers on.
pub const MESSAGES_PATH: &str = "/v1/messages";

/// A running mock of the upstream messaging API.
pub struct MockUpstream {
    server: MockServer,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full URL to point `anthropic.api_url` at.
    pub fn messages_url(&self) -> String {
        format!("{}{MESSAGES_PATH}", self.server.uri())
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Answer every call with 200 and one text block per entry.
    pub async fn reply_text(&self, texts: &[&str]) {
        let blocks: Vec<Value> = texts
            .iter()
            .map(|t| json!({"type": "text", "text": t}))
            .collect();
        self.reply_blocks(Value::Array(blocks)).await;
    }

    /// Answer every call with 200 and the given `content` array.
    pub async fn reply_blocks(&self, content: Value) {
        self.reply_json(200, message_body(content)).await;
    }

    /// Answer every call with `status` and a JSON body.
    pub async fn reply_json(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer every call with `status` and the standard error envelope.
    pub async fn reply_error(&self, status: u16, error_type: &str, message: &str) {
        self.reply_json(
            status,
            json!({"type": "error", "error": {"type": error_type, "message": message}}),
        )
        .await;
    }

    /// Fail the test on drop if any call reaches the mock.
    pub async fn expect_no_calls(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }

    /// JSON bodies of the requests received so far.
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Value of `name` on each received request, `None` where it was absent.
    pub async fn received_header(&self, name: &str) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| {
                r.headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }
}

/// A Messages API success body wrapping `content`.
pub fn message_body(content: Value) -> Value {
    json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-20241022",
        "content": content,
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 12, "output_tokens": 34}
    })
}
