// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Readable reports for broken `odoobot.toml` files.
//!
//! Figment errors are turned into [`ConfigError`] diagnostics that name the
//! full dotted key (`mcp.ulr`), point at the offending line when the file is
//! known, and suggest either a close spelling in the same table or the table
//! a misplaced key belongs to.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt::Write as _;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must beat to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Keys accepted by each table of `odoobot.toml`.
const TABLE_KEYS: &[(&str, &[&str])] = &[
    ("chatbot", &["name", "backend", "log_level"]),
    (
        "anthropic",
        &[
            "api_key",
            "model",
            "api_url",
            "api_version",
            "tool_beta",
            "direct_timeout_secs",
            "tool_timeout_secs",
            "max_tokens",
        ],
    ),
    (
        "anthropic.max_tokens",
        &["direct_fast", "direct_full", "tool_fast", "tool_full"],
    ),
    ("mcp", &["url", "server_name"]),
    (
        "routing",
        &["simple_query_max_chars", "default_mode", "endpoint_cache_capacity"],
    ),
    ("pool", &["max_idle_per_host", "connect_retries", "async_workers"]),
];

/// What to tell the user about an unknown key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// A close spelling exists in the same table.
    Spelling(String),
    /// The key is valid, but in another table.
    Table(String),
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suggestion::Spelling(key) => write!(f, "did you mean `{key}`?"),
            Suggestion::Table(table) => write!(f, "this key belongs in `[{table}]`"),
        }
    }
}

/// A configuration problem ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no table accepts at this position.
    #[error("unknown configuration key `{}`", dotted(table.as_deref(), key))]
    #[diagnostic(
        code(odoobot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_ref(), valid_keys))
    )]
    UnknownKey {
        /// Enclosing table (`mcp`, `anthropic.max_tokens`), `None` at top level.
        table: Option<String>,
        key: String,
        suggestion: Option<Suggestion>,
        /// Comma-separated keys the table accepts.
        valid_keys: String,
        #[label("not a known key here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(odoobot::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Full dotted key.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(odoobot::config::missing_key),
        help("add `{key} = <value>` to your odoobot.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but is not acceptable.
    #[error("validation error: {message}")]
    #[diagnostic(code(odoobot::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(odoobot::config::other))]
    Other(String),
}

fn dotted(table: Option<&str>, key: &str) -> String {
    match table {
        Some(table) => format!("{table}.{key}"),
        None => key.to_string(),
    }
}

fn unknown_key_help(suggestion: Option<&Suggestion>, valid_keys: &str) -> String {
    let mut help = String::new();
    if let Some(suggestion) = suggestion {
        let _ = write!(help, "{suggestion} ");
    }
    let _ = write!(help, "accepted here: {valid_keys}");
    help
}

/// Turn every error carried by `err` into a [`ConfigError`].
///
/// `sources` holds `(path, content)` pairs for the TOML files that were read,
/// used to attach a labelled span to the report.
pub fn diagnose(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let table = (!error.path.is_empty()).then(|| error.path.join("."));
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let (span, src) = locate(&error, table.as_deref(), key, sources);
                    ConfigError::UnknownKey {
                        suggestion: suggest(table.as_deref(), key, expected),
                        valid_keys: expected.join(", "),
                        table,
                        key: key.clone(),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    // figment puts the offending key last in the path
                    let (parent, key) = match error.path.split_last() {
                        Some((key, parent)) if !parent.is_empty() => {
                            (Some(parent.join(".")), key.as_str())
                        }
                        Some((key, _)) => (None, key.as_str()),
                        None => (None, ""),
                    };
                    let (span, src) = locate(&error, parent.as_deref(), key, sources);
                    ConfigError::InvalidType {
                        key: dotted(parent.as_deref(), key),
                        detail: format!("found {actual}, expected {expected}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: dotted(table.as_deref(), key),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Best hint for `key` found in `table` (or at top level).
///
/// A close spelling among `accepted` wins; otherwise, if another table
/// accepts `key` verbatim, that table is named.
pub fn suggest(table: Option<&str>, key: &str, accepted: &[&str]) -> Option<Suggestion> {
    let spelling = accepted
        .iter()
        .map(|candidate| (strsim::jaro_winkler(key, candidate), *candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| Suggestion::Spelling(candidate.to_string()));

    spelling.or_else(|| {
        TABLE_KEYS
            .iter()
            .find(|(name, keys)| Some(*name) != table && keys.contains(&key))
            .map(|(name, _)| Suggestion::Table((*name).to_string()))
    })
}

/// Span and named source for `key` inside `table`.
///
/// The file figment reports is searched first, then every known source.
fn locate(
    error: &figment::error::Error,
    table: Option<&str>,
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let reported = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // figment may report an absolute path for a file read as relative
    let candidates = sources
        .iter()
        .filter(|(path, _)| reported.as_ref().is_none_or(|r| r == path))
        .chain(sources.iter());

    for (path, content) in candidates {
        if let Some(offset) = key_offset(content, table, key) {
            return (
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(path, content.clone())),
            );
        }
    }
    (None, None)
}

/// Byte offset of `key` as written inside `[table]`.
///
/// With no table, top-level keys and table headers named `key` match.
///
/// Tracks the current table header line by line, so a key of the same name
/// in another table is never matched. Quoted and dotted keys are not
/// recognised.
pub fn key_offset(content: &str, table: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
            if table.is_none() && current == Some(key) {
                return Some(offset + indent + 1);
            }
        } else if current == table {
            let name = trimmed.split('=').next().map(str::trim_end);
            if trimmed.contains('=') && name == Some(key) {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Print `errors` to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

/// Every table name the file may contain, including nested ones.
pub fn known_tables() -> impl Iterator<Item = &'static str> {
    TABLE_KEYS.iter().map(|(name, _)| *name)
}
