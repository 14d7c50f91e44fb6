// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure routing helpers for the Odoo chatbot dispatcher.
//!
//! This crate provides:
//! - [`QueryClassifier`]: keyword heuristics deciding whether an input is a
//!   greeting, a data query or neither
//! - [`build_prompt`]: French instruction templates wrapped around the user input
//! - [`resolve_tool_endpoint`] / [`EndpointResolver`]: normalization of the
//!   tool server base URL into its streaming endpoint, with a bounded cache
//!
//! Nothing here performs I/O.

pub mod cache;
pub mod classifier;
pub mod endpoint;
pub mod prompt;

pub use cache::LruCache;
pub use classifier::{QueryClassifier, QueryKind, DEFAULT_SIMPLE_MAX_CHARS};
pub use endpoint::{resolve_tool_endpoint, EndpointResolver};
pub use prompt::build_prompt;
