// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Final touch-up of tool-augmented replies before display.

use odoobot_core::is_error_text;

/// Bold banner some tool servers prepend to their result listings.
const RESULTS_BANNER: &str = "**Résultats :**";

/// Start of a role/message dump leaked by a tool server.
const ROLE_DUMP: &str = "[{'role': 'assistant'";

/// Replies longer than this many characters are post-processed.
const LONG_REPLY_CHARS: usize = 300;

/// Alternative error prefix used by tool servers.
const CROSS_MARK: &str = "❌";

/// True when a reply from a tool-augmented setup should go through
/// [`post_process`].
pub fn needs_post_processing(raw: &str, tool_configured: bool) -> bool {
    tool_configured
        && (raw.contains(RESULTS_BANNER)
            || raw.contains(ROLE_DUMP)
            || raw.chars().count() > LONG_REPLY_CHARS)
}

/// Trim the reply and append a provenance footer naming `source_name`.
///
/// Error texts are returned untouched.
pub fn post_process(raw: &str, source_name: Option<&str>) -> String {
    if is_error_text(raw) || raw.starts_with(CROSS_MARK) {
        return raw.to_string();
    }

    let mut formatted = raw.trim().to_string();
    if let Some(name) = source_name.map(str::trim).filter(|n| !n.is_empty()) {
        formatted.push_str("\n\n📋 Traité via ");
        formatted.push_str(name);
    }
    formatted
}
