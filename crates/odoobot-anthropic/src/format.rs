// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reduces response blocks to a display string.

use odoobot_core::VerbosityMode;
use tracing::debug;

use crate::types::ResponseBlock;

/// Returned when no text block survives filtering.
pub const PLACEHOLDER: &str = "no response";

/// Join the text blocks of a reply.
///
/// Blocks that look like a raw JSON array of objects are dropped. Fast mode
/// separates blocks with a blank line, full mode with a single newline.
/// Tool results are read in full mode but never emitted.
pub fn format_blocks(blocks: &[ResponseBlock], mode: VerbosityMode) -> String {
    let texts = text_parts(blocks);

    let separator = match mode {
        VerbosityMode::Fast => "\n\n",
        VerbosityMode::Full => {
            let tool_results = extract_tool_results(blocks);
            debug!(
                tool_results = tool_results.len(),
                "tool results parsed, not included in reply"
            );
            "\n"
        }
    };

    if texts.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        texts.join(separator)
    }
}

/// Text of every non-error tool result block.
///
/// Takes the trimmed `text` field of the first content item, or the
/// serialized content when that item has none. Empty results are skipped.
pub fn extract_tool_results(blocks: &[ResponseBlock]) -> Vec<String> {
    blocks
        .iter()
        .filter_map(|block| match block {
            ResponseBlock::McpToolResult {
                content,
                is_error: false,
            } => {
                let first = content.first()?;
                let text = match first.get("text").and_then(|t| t.as_str()) {
                    Some(text) => text.trim().to_string(),
                    None => serde_json::Value::Array(content.clone()).to_string(),
                };
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        })
        .collect()
}

fn text_parts(blocks: &[ResponseBlock]) -> Vec<&str> {
    blocks
        .iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text.trim()),
            _ => None,
        })
        .filter(|text| !text.is_empty() && !looks_like_raw_payload(text))
        .collect()
}

fn looks_like_raw_payload(text: &str) -> bool {
    text.starts_with("[{") && text.ends_with("}]")
}
