// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Odoo chatbot dispatcher.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use odoobot_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Chatbot name: {}", config.chatbot.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::OdoobotConfig;

use tracing::debug;

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error every config file that exists is re-read so the
/// diagnostics can point at the offending key.
pub fn load_and_validate() -> Result<OdoobotConfig, Vec<ConfigError>> {
    validated(loader::load_config(), read_config_files)
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<OdoobotConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn validated(
    loaded: Result<OdoobotConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<OdoobotConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::diagnose(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn read_config_files() -> Vec<(String, String)> {
    loader::config_files()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            debug!(path = %path.display(), "re-reading config file for diagnostics");
            Some((path.display().to_string(), content))
        })
        .collect()
}
