// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, non-zero timeouts and positive token ceilings.

use crate::diagnostic::ConfigError;
use crate::model::OdoobotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &OdoobotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.chatbot.backend.trim().is_empty() {
        fail("chatbot.backend must not be empty".to_string());
    }

    let api_url = config.anthropic.api_url.trim();
    if api_url.is_empty() {
        fail("anthropic.api_url must not be empty".to_string());
    } else if !is_http_url(api_url) {
        fail(format!(
            "anthropic.api_url `{api_url}` must start with http:// or https://"
        ));
    }

    if config.anthropic.direct_timeout_secs == 0 {
        fail("anthropic.direct_timeout_secs must be greater than 0".to_string());
    }
    if config.anthropic.tool_timeout_secs == 0 {
        fail("anthropic.tool_timeout_secs must be greater than 0".to_string());
    }

    let budgets = &config.anthropic.max_tokens;
    for (key, value) in [
        ("direct_fast", budgets.direct_fast),
        ("direct_full", budgets.direct_full),
        ("tool_fast", budgets.tool_fast),
        ("tool_full", budgets.tool_full),
    ] {
        if value == 0 {
            fail(format!("anthropic.max_tokens.{key} must be greater than 0"));
        }
    }

    if let Some(url) = config.mcp.url.as_deref() {
        let url = url.trim();
        if !url.is_empty() && !is_http_url(url) {
            fail(format!("mcp.url `{url}` must start with http:// or https://"));
        }
    }

    if config.mcp.server_name.trim().is_empty() {
        fail("mcp.server_name must not be empty".to_string());
    }

    if config.routing.simple_query_max_chars < 1 {
        fail("routing.simple_query_max_chars must be at least 1".to_string());
    }
    if config.routing.endpoint_cache_capacity < 1 {
        fail("routing.endpoint_cache_capacity must be at least 1".to_string());
    }

    if config.pool.async_workers < 1 {
        fail("pool.async_workers must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
