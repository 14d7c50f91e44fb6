// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Odoo chatbot dispatcher.
//!
//! Holds the error taxonomy and the request/response value types shared by
//! the router, the upstream client and the dispatcher crates.

pub mod error;
pub mod types;

pub use error::{ChatbotError, DispatchError, TransportFailure, ERROR_MARKER};
pub use types::{ChatConfiguration, ChatRequest, ChatResponse, VerbosityMode, is_error_text};
