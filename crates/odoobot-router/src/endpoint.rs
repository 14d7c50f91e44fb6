// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool server endpoint normalization.
//!
//! Users paste the base URL of their tool server; the messaging API needs
//! the streaming endpoint under `/gradio_api/mcp/sse`.

use std::sync::Mutex;

use tracing::debug;

use crate::cache::LruCache;

const TOOL_PATH: &str = "/gradio_api/mcp";
const STREAM_SUFFIX: &str = "/sse";

/// Default number of distinct base URLs remembered by [`EndpointResolver`].
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Turn a configured base URL into the streaming tool endpoint.
///
/// Idempotent: resolving an already resolved URL returns it unchanged.
pub fn resolve_tool_endpoint(base_url: &str) -> String {
    let full_path = format!("{TOOL_PATH}{STREAM_SUFFIX}");
    if base_url.ends_with(STREAM_SUFFIX) || base_url.contains(&full_path) {
        return base_url.to_string();
    }

    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(TOOL_PATH) {
        return format!("{trimmed}{STREAM_SUFFIX}");
    }
    if base_url.contains(TOOL_PATH) {
        return base_url.to_string();
    }
    format!("{trimmed}{full_path}")
}

/// [`resolve_tool_endpoint`] behind a bounded LRU cache.
///
/// The lock covers lookup and insert only; resolution itself runs unlocked.
#[derive(Debug)]
pub struct EndpointResolver {
    cache: Mutex<LruCache<String, String>>,
}

impl EndpointResolver {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn resolve(&self, base_url: &str) -> String {
        let key = base_url.to_string();
        {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(&key) {
                debug!(base_url, "tool endpoint cache hit");
                return hit;
            }
        }

        let resolved = resolve_tool_endpoint(base_url);
        debug!(base_url, endpoint = resolved.as_str(), "resolved tool endpoint");
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, resolved.clone());
        resolved
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for EndpointResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
