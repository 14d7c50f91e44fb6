// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the chatbot workspace.
//!
//! [`ChatbotError`] covers fallible setup paths (configuration, HTTP client
//! construction, worker pool start-up). [`DispatchError`] is the dispatch
//! taxonomy; it never crosses the dispatcher boundary and is turned into an
//! error-tagged [`ChatResponse`](crate::types::ChatResponse) instead.

use std::fmt;

use thiserror::Error;

/// Fixed leading marker of every error text shown to the user.
pub const ERROR_MARKER: &str = "KO :";

/// Setup and infrastructure errors.
#[derive(Debug, Error)]
pub enum ChatbotError {
    /// Configuration errors (invalid TOML, missing fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream provider errors (client construction, request building).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Transport-level failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The per-call timeout elapsed.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// Any other send or body-read failure.
    Other,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Timeout => write!(f, "request timed out"),
            TransportFailure::Connect => write!(f, "connection error"),
            TransportFailure::Other => write!(f, "transport error"),
        }
    }
}

/// Everything that can go wrong during a single dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// User input was empty or whitespace only.
    #[error("empty request")]
    EmptyInput,

    /// No API key in the request configuration.
    #[error("API key required")]
    MissingCredential,

    /// Upstream rejected the request with HTTP 400.
    #[error("invalid configuration")]
    InvalidConfiguration,

    /// Timeout, connect error or other transport failure.
    #[error("{kind}: {message}")]
    Transport {
        kind: TransportFailure,
        message: String,
    },

    /// Upstream answered with a non-200, non-400 status.
    #[error("upstream error {status}")]
    Upstream { status: u16 },

    /// Anything else (unparseable body, client construction failure, ...).
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl DispatchError {
    /// HTTP status associated with the error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::InvalidConfiguration => Some(400),
            DispatchError::Upstream { status } => Some(*status),
            _ => None,
        }
    }

    /// Shorthand for a transport failure.
    pub fn transport(kind: TransportFailure, message: impl Into<String>) -> Self {
        DispatchError::Transport {
            kind,
            message: message.into(),
        }
    }
}

impl From<ChatbotError> for DispatchError {
    fn from(err: ChatbotError) -> Self {
        match err {
            ChatbotError::Timeout { duration } => DispatchError::transport(
                TransportFailure::Timeout,
                format!("no answer after {duration:?}"),
            ),
            other => DispatchError::Unexpected(other.to_string()),
        }
    }
}
