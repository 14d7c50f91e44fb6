// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messages API adapter for the Odoo chatbot dispatcher.
//!
//! Wire types, the per-backend connection cache, the HTTP call itself and
//! the formatter that turns reply blocks into display text.

pub mod client;
pub mod format;
pub mod session;
pub mod types;

pub use client::AnthropicClient;
pub use format::{extract_tool_results, format_blocks, PLACEHOLDER};
pub use session::{session_key, ConnectionHandle, ConnectionSettings, SessionManager};
pub use types::{McpServer, MessageRequest, MessagesResponse, ResponseBlock};

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// API key from config, falling back to `ANTHROPIC_API_KEY`.
///
/// Blank values count as missing.
pub fn resolve_api_key(config_key: Option<&str>) -> Option<String> {
    resolve_api_key_with(config_key, |name| std::env::var(name).ok())
}

fn resolve_api_key_with(
    config_key: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if let Some(key) = config_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }
    env(API_KEY_ENV).filter(|k| !k.trim().is_empty())
}
