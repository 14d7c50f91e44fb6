// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./odoobot.toml` > `~/.config/odoobot/odoobot.toml` > `/etc/odoobot/odoobot.toml`
//! with environment variable overrides via `ODOOBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::OdoobotConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/odoobot/odoobot.toml";
pub(crate) const LOCAL_CONFIG: &str = "odoobot.toml";

/// Top-level tables of `odoobot.toml`, in documentation order.
pub const SECTIONS: [&str; 5] = ["chatbot", "anthropic", "mcp", "routing", "pool"];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("odoobot/odoobot.toml"))
}

/// Candidate config files, lowest precedence first.
pub fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(SYSTEM_CONFIG)];
    files.extend(user_config_path());
    files.push(PathBuf::from(LOCAL_CONFIG));
    files
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/odoobot/odoobot.toml` (system-wide)
/// 3. `~/.config/odoobot/odoobot.toml` (user XDG config)
/// 4. `./odoobot.toml` (local directory)
/// 5. `ODOOBOT_*` environment variables
pub fn load_config() -> Result<OdoobotConfig, figment::Error> {
    let config = build_figment().extract()?;
    debug!("configuration loaded");
    Ok(config)
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OdoobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OdoobotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OdoobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OdoobotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    config_files()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(OdoobotConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// `Env::split("_")` would turn `ODOOBOT_MCP_SERVER_NAME` into
/// `mcp.server.name`; only the first underscore after the section is a separator.
fn env_provider() -> Env {
    Env::prefixed("ODOOBOT_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("mcp_server_name"), "mcp.server_name");
        assert_eq!(map_env_key("anthropic_api_key"), "anthropic.api_key");
        assert_eq!(
            map_env_key("routing_simple_query_max_chars"),
            "routing.simple_query_max_chars"
        );
        assert_eq!(map_env_key("pool_async_workers"), "pool.async_workers");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn config_files_are_listed_lowest_precedence_first() {
        let files = config_files();
        assert_eq!(files.first(), Some(&PathBuf::from(SYSTEM_CONFIG)));
        assert_eq!(files.last(), Some(&PathBuf::from(LOCAL_CONFIG)));
        if let Some(user) = user_config_path() {
            assert_eq!(files, vec![PathBuf::from(SYSTEM_CONFIG), user, PathBuf::from(LOCAL_CONFIG)]);
        }
    }

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str("[mcp]\nurl = \"https://mcp.example.com\"\n").unwrap();
        assert_eq!(config.mcp.url.as_deref(), Some("https://mcp.example.com"));
        assert_eq!(config.mcp.server_name, "odoo-mcp-server");
    }
}
