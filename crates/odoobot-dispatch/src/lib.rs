// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat dispatch for the Odoo chatbot.
//!
//! The [`Dispatcher`] is the central coordinator that:
//! - Rejects empty input and missing credentials before any network call
//! - Classifies the message and picks the direct or tool-augmented route
//! - Sends the request over a cached per-backend connection
//! - Formats the reply blocks into display text
//!
//! [`WorkerPool`] runs dispatches in the background for callers that do not
//! want to wait, and [`post_process`] adds the provenance footer to long
//! tool-augmented replies.

pub mod dispatcher;
pub mod pool;
pub mod postprocess;

pub use dispatcher::{Dispatcher, Route, RoutePlan};
pub use pool::{WorkerPool, DEFAULT_WORKERS};
pub use postprocess::{needs_post_processing, post_process};
