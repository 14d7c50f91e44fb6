// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types exchanged between the caller and the dispatcher.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{DispatchError, ERROR_MARKER};

/// How much instruction and token budget an answer gets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerbosityMode {
    /// Terse instructions, lower token ceiling.
    #[default]
    Fast,
    /// Detailed formatting instructions, higher token ceiling.
    Full,
}

/// Per-request upstream settings, resolved by the caller before dispatch.
#[derive(Debug, Default)]
pub struct ChatConfiguration {
    /// Upstream API key.
    pub api_key: Option<SecretString>,
    /// Model identifier; the dispatcher default is used when `None`.
    pub model: Option<String>,
    /// Base URL of the remote tool server; `None` means direct calls only.
    pub tool_endpoint_base: Option<String>,
}

impl ChatConfiguration {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            model: None,
            tool_endpoint_base: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tool_endpoint(mut self, base_url: impl Into<String>) -> Self {
        self.tool_endpoint_base = Some(base_url.into());
        self
    }

    /// The API key without surrounding whitespace, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret().trim())
            .filter(|key| !key.is_empty())
    }

    /// The tool endpoint base URL, if one is set and not blank.
    pub fn tool_endpoint(&self) -> Option<&str> {
        self.tool_endpoint_base
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// The model override, if one is set and not blank.
    pub fn model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
    }
}

/// One chat turn to dispatch. Immutable once built.
#[derive(Debug)]
pub struct ChatRequest {
    pub user_input: String,
    pub configuration: ChatConfiguration,
    pub verbosity_mode: VerbosityMode,
}

impl ChatRequest {
    pub fn new(user_input: impl Into<String>, configuration: ChatConfiguration) -> Self {
        Self {
            user_input: user_input.into(),
            configuration,
            verbosity_mode: VerbosityMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: VerbosityMode) -> Self {
        self.verbosity_mode = mode;
        self
    }
}

/// Display-ready outcome of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub display_text: String,
    pub is_error: bool,
    pub raw_status: Option<u16>,
}

impl ChatResponse {
    pub fn success(display_text: impl Into<String>, raw_status: Option<u16>) -> Self {
        Self {
            display_text: display_text.into(),
            is_error: false,
            raw_status,
        }
    }

    /// Error response carrying the fixed marker followed by the reason.
    pub fn from_error(err: &DispatchError) -> Self {
        Self {
            display_text: format!("{ERROR_MARKER} {err}"),
            is_error: true,
            raw_status: err.status(),
        }
    }
}

impl From<DispatchError> for ChatResponse {
    fn from(err: DispatchError) -> Self {
        Self::from_error(&err)
    }
}

/// True when `text` starts with the error marker.
pub fn is_error_text(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_MARKER)
}
