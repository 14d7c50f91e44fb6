// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Odoobot integration tests.
//!
//! Provides a mock upstream and configuration helpers for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockUpstream`] - wiremock server speaking the Messages API
//! - [`test_config`] / [`test_request`] - configuration pointed at a mock

pub mod mock_upstream;

pub use mock_upstream::{message_body, MockUpstream, MESSAGES_PATH};

use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatConfiguration, ChatRequest, VerbosityMode};

/// API key used by [`test_request`].
pub const TEST_API_KEY: &str = "sk-ant-test-key";

/// Default configuration with the messages endpoint replaced by `api_url`.
pub fn test_config(api_url: &str) -> OdoobotConfig {
    let mut config = OdoobotConfig::default();
    config.anthropic.api_url = api_url.to_string();
    config.chatbot.backend = "test-db".to_string();
    config
}

/// Request carrying [`TEST_API_KEY`] and an optional tool endpoint.
pub fn test_request(input: &str, tool_endpoint: Option<&str>, mode: VerbosityMode) -> ChatRequest {
    let mut configuration = ChatConfiguration::new(TEST_API_KEY);
    if let Some(endpoint) = tool_endpoint {
        configuration = configuration.with_tool_endpoint(endpoint);
    }
    ChatRequest::new(input, configuration).with_mode(mode)
}
