// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP calls to the Messages API.
//!
//! [`AnthropicClient`] builds the headers, sends a [`MessageRequest`] over a
//! pooled [`ConnectionHandle`] and maps the outcome onto [`DispatchError`].

use std::time::Duration;

use odoobot_config::model::AnthropicConfig;
use odoobot_core::{DispatchError, TransportFailure};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::session::ConnectionHandle;
use crate::types::{ApiErrorResponse, MessageRequest, MessagesResponse};

/// Base URL for the Messages API.
pub const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Endpoint and protocol headers for the Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    base_url: String,
    api_version: String,
    tool_beta: String,
}

impl AnthropicClient {
    pub fn new(api_version: impl Into<String>, tool_beta: impl Into<String>) -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            api_version: api_version.into(),
            tool_beta: tool_beta.into(),
        }
    }

    pub fn from_config(config: &AnthropicConfig) -> Self {
        Self::new(config.api_version.clone(), config.tool_beta.clone())
            .with_base_url(config.api_url.clone())
    }

    /// Overrides the endpoint (mock servers, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and parse a 200 reply.
    ///
    /// The tool beta header is added when the request advertises a tool
    /// server. HTTP 400 maps to `InvalidConfiguration`, any other non-200
    /// status to `Upstream`. No retry happens here beyond the connection
    /// handle's reconnect.
    pub async fn complete_message(
        &self,
        connection: &ConnectionHandle,
        api_key: &str,
        request: &MessageRequest,
        timeout: Duration,
    ) -> Result<MessagesResponse, DispatchError> {
        let headers = self.headers(api_key, request.is_tool_augmented())?;

        let response = connection
            .post_json(&self.base_url, headers, request, timeout)
            .await
            .map_err(|e| transport_error(&e, timeout))?;

        let status = response.status().as_u16();
        debug!(status, tool = request.is_tool_augmented(), "completion response received");

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&e, timeout))?;

        match status {
            200 => serde_json::from_str::<MessagesResponse>(&body)
                .map_err(|e| DispatchError::Unexpected(format!("failed to parse API response: {e}"))),
            400 => {
                warn!(status, detail = %error_detail(&body), "upstream rejected request");
                Err(DispatchError::InvalidConfiguration)
            }
            _ => {
                warn!(status, detail = %error_detail(&body), "upstream error");
                Err(DispatchError::Upstream { status })
            }
        }
    }

    fn headers(&self, api_key: &str, tool_augmented: bool) -> Result<HeaderMap, DispatchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| DispatchError::Unexpected(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&self.api_version).map_err(|e| {
                DispatchError::Unexpected(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if tool_augmented {
            headers.insert(
                "anthropic-beta",
                HeaderValue::from_str(&self.tool_beta).map_err(|e| {
                    DispatchError::Unexpected(format!("invalid beta header value: {e}"))
                })?,
            );
        }
        Ok(headers)
    }
}

fn transport_error(err: &reqwest::Error, timeout: Duration) -> DispatchError {
    if err.is_timeout() {
        DispatchError::transport(
            TransportFailure::Timeout,
            format!("no answer after {}s", timeout.as_secs_f32()),
        )
    } else if err.is_connect() {
        DispatchError::transport(TransportFailure::Connect, err.to_string())
    } else {
        DispatchError::transport(TransportFailure::Other, err.to_string())
    }
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!("{}: {}", api_err.error.type_, api_err.error.message),
        Err(_) => body.chars().take(200).collect(),
    }
}
