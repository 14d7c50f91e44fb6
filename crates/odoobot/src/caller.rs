// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The calling side of a chat turn.
//!
//! Resolves the per-request settings from configuration and command-line
//! overrides, builds [`ChatRequest`]s, and turns responses into the text the
//! user sees.

use odoobot_anthropic::resolve_api_key;
use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatConfiguration, ChatRequest, ChatResponse, DispatchError, VerbosityMode};
use odoobot_dispatch::{needs_post_processing, post_process, Dispatcher};
use tokio::task::JoinHandle;

/// Settings given on the command line; they win over file and env values.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub mcp_url: Option<String>,
}

/// Builds requests and renders replies for one front end.
#[derive(Debug, Clone)]
pub struct Caller {
    dispatcher: Dispatcher,
    api_key: Option<String>,
    model: Option<String>,
    tool_endpoint: Option<String>,
    default_mode: VerbosityMode,
    name: String,
}

impl Caller {
    pub fn new(config: &OdoobotConfig, overrides: Overrides) -> Self {
        let api_key = non_blank(overrides.api_key)
            .or_else(|| resolve_api_key(config.anthropic.api_key.as_deref()));
        let tool_endpoint = non_blank(overrides.mcp_url).or_else(|| non_blank(config.mcp.url.clone()));

        Self {
            dispatcher: Dispatcher::new(config),
            api_key,
            model: config.anthropic.model.clone(),
            tool_endpoint,
            default_mode: config.routing.default_mode,
            name: config.chatbot.name.clone(),
        }
    }

    /// Replace the dispatcher (private connection cache, test pool).
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn tool_configured(&self) -> bool {
        self.tool_endpoint.is_some()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Request for `input`; `mode` falls back to the configured default.
    pub fn request(&self, input: &str, mode: Option<VerbosityMode>) -> ChatRequest {
        let mut configuration = match &self.api_key {
            Some(key) => ChatConfiguration::new(key.as_str()),
            None => ChatConfiguration::default(),
        };
        if let Some(model) = &self.model {
            configuration = configuration.with_model(model.as_str());
        }
        if let Some(endpoint) = &self.tool_endpoint {
            configuration = configuration.with_tool_endpoint(endpoint.as_str());
        }
        ChatRequest::new(input, configuration).with_mode(mode.unwrap_or(self.default_mode))
    }

    /// Dispatch `input` and return the text to display.
    pub async fn ask(&self, input: &str, mode: Option<VerbosityMode>) -> (String, bool) {
        let response = self.dispatcher.dispatch(self.request(input, mode)).await;
        let is_error = response.is_error;
        (self.render(response), is_error)
    }

    /// Dispatch `input` in the background and hand the rendered text to
    /// `on_display`.
    pub fn ask_async<F>(
        &self,
        input: &str,
        mode: Option<VerbosityMode>,
        on_display: F,
    ) -> Result<JoinHandle<()>, DispatchError>
    where
        F: FnOnce(String, bool) + Send + 'static,
    {
        let renderer = self.clone();
        self.dispatcher
            .dispatch_async(self.request(input, mode), move |response| {
                let is_error = response.is_error;
                on_display(renderer.render(response), is_error);
            })
    }

    /// Display text for `response`, post-processed for long tool replies.
    pub fn render(&self, response: ChatResponse) -> String {
        if needs_post_processing(&response.display_text, self.tool_configured()) {
            post_process(&response.display_text, Some(&self.name))
        } else {
            response.display_text
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
