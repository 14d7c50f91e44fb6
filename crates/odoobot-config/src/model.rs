// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use odoobot_core::VerbosityMode;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OdoobotConfig {
    /// Chatbot identity and logging.
    #[serde(default)]
    pub chatbot: ChatbotConfig,

    /// Upstream messaging API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Remote tool server settings.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Query classification and routing settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Connection pool and async worker settings.
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Chatbot identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatbotConfig {
    /// Display name, also used as the provenance footer of post-processed replies.
    #[serde(default = "default_chatbot_name")]
    pub name: String,

    /// Logical backend identity (tenant/database name). One pooled
    /// connection is kept per backend.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            name: default_chatbot_name(),
            backend: default_backend(),
            log_level: default_log_level(),
        }
    }
}

fn default_chatbot_name() -> String {
    "Configuration Chatbot".to_string()
}

fn default_backend() -> String {
    "odoo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Upstream messaging API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. `None` falls back to the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model override. `None` uses [`DEFAULT_MODEL`].
    #[serde(default)]
    pub model: Option<String>,

    /// Messages endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// `anthropic-version` header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// `anthropic-beta` header value sent on tool-augmented calls.
    #[serde(default = "default_tool_beta")]
    pub tool_beta: String,

    /// Timeout for direct calls, in seconds.
    #[serde(default = "default_direct_timeout_secs")]
    pub direct_timeout_secs: u64,

    /// Timeout for tool-augmented calls, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Token ceiling per route and verbosity.
    #[serde(default)]
    pub max_tokens: TokenBudgets,
}

/// Model used when neither the request nor the config names one.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            api_url: default_api_url(),
            api_version: default_api_version(),
            tool_beta: default_tool_beta(),
            direct_timeout_secs: default_direct_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            max_tokens: TokenBudgets::default(),
        }
    }
}

impl AnthropicConfig {
    /// Configured model or [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn direct_timeout(&self) -> Duration {
        Duration::from_secs(self.direct_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

fn default_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_tool_beta() -> String {
    "mcp-client-2025-04-04".to_string()
}

fn default_direct_timeout_secs() -> u64 {
    15
}

fn default_tool_timeout_secs() -> u64 {
    35
}

/// Token ceilings. Fast is below full, direct is below tool-augmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenBudgets {
    #[serde(default = "default_direct_fast")]
    pub direct_fast: u32,
    #[serde(default = "default_direct_full")]
    pub direct_full: u32,
    #[serde(default = "default_tool_fast")]
    pub tool_fast: u32,
    #[serde(default = "default_tool_full")]
    pub tool_full: u32,
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            direct_fast: default_direct_fast(),
            direct_full: default_direct_full(),
            tool_fast: default_tool_fast(),
            tool_full: default_tool_full(),
        }
    }
}

impl TokenBudgets {
    /// Ceiling for the given route and mode.
    pub fn for_route(&self, tool_augmented: bool, mode: VerbosityMode) -> u32 {
        match (tool_augmented, mode) {
            (false, VerbosityMode::Fast) => self.direct_fast,
            (false, VerbosityMode::Full) => self.direct_full,
            (true, VerbosityMode::Fast) => self.tool_fast,
            (true, VerbosityMode::Full) => self.tool_full,
        }
    }
}

fn default_direct_fast() -> u32 {
    512
}

fn default_direct_full() -> u32 {
    800
}

fn default_tool_fast() -> u32 {
    1000
}

fn default_tool_full() -> u32 {
    2000
}

/// Remote tool server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    /// Base URL of the tool server. `None` disables tool-augmented calls.
    #[serde(default)]
    pub url: Option<String>,

    /// Server name advertised to the model.
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: None,
            server_name: default_server_name(),
        }
    }
}

fn default_server_name() -> String {
    "odoo-mcp-server".to_string()
}

/// Query classification and routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Greeting-only inputs shorter than this many characters skip the tool server.
    #[serde(default = "default_simple_query_max_chars")]
    pub simple_query_max_chars: usize,

    /// Verbosity used when the caller does not pick one.
    #[serde(default)]
    pub default_mode: VerbosityMode,

    /// Capacity of the resolved tool endpoint cache.
    #[serde(default = "default_endpoint_cache_capacity")]
    pub endpoint_cache_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            simple_query_max_chars: default_simple_query_max_chars(),
            default_mode: VerbosityMode::default(),
            endpoint_cache_capacity: default_endpoint_cache_capacity(),
        }
    }
}

fn default_simple_query_max_chars() -> usize {
    20
}

fn default_endpoint_cache_capacity() -> usize {
    128
}

/// Outbound connection pool and async worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Idle keep-alive connections kept per upstream host.
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Extra attempts after a failed connection establishment.
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Worker threads serving fire-and-forget dispatches.
    #[serde(default = "default_async_workers")]
    pub async_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_max_idle_per_host(),
            connect_retries: default_connect_retries(),
            async_workers: default_async_workers(),
        }
    }
}

fn default_max_idle_per_host() -> usize {
    10
}

fn default_connect_retries() -> u32 {
    1
}

fn default_async_workers() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_budgets_order_fast_below_full_and_direct_below_tool() {
        let budgets = TokenBudgets::default();
        assert!(budgets.direct_fast < budgets.direct_full);
        assert!(budgets.tool_fast < budgets.tool_full);
        assert!(budgets.direct_fast < budgets.tool_fast);
        assert!(budgets.direct_full < budgets.tool_full);
        assert_eq!(budgets.for_route(true, VerbosityMode::Full), 2000);
        assert_eq!(budgets.for_route(false, VerbosityMode::Fast), 512);
    }

    #[test]
    fn model_or_default_ignores_blank_override() {
        let mut config = AnthropicConfig::default();
        assert_eq!(config.model_or_default(), DEFAULT_MODEL);
        config.model = Some("  ".into());
        assert_eq!(config.model_or_default(), DEFAULT_MODEL);
        config.model = Some("claude-3-5-haiku-latest".into());
        assert_eq!(config.model_or_default(), "claude-3-5-haiku-latest");
    }

    #[test]
    fn nested_token_table_deserializes() {
        let toml_str = r#"
[anthropic.max_tokens]
tool_full = 4000
"#;
        let config: OdoobotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.anthropic.max_tokens.tool_full, 4000);
        assert_eq!(config.anthropic.max_tokens.direct_fast, 512);
    }

    #[test]
    fn default_mode_parses_lowercase() {
        let toml_str = r#"
[routing]
default_mode = "full"
"#;
        let config: OdoobotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.routing.default_mode, VerbosityMode::Full);
    }
}
