// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Odoobot - command-line front end for the Odoo chatbot dispatcher.
//!
//! This is the binary entry point.

mod caller;
mod shell;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatbotError, VerbosityMode, ERROR_MARKER};
use tracing::error;

use crate::caller::{Caller, Overrides};

/// Odoobot - ask questions about your Odoo data.
#[derive(Parser, Debug)]
#[command(name = "odoobot", version, about, long_about = None)]
struct Cli {
    /// API key, overriding configuration and ANTHROPIC_API_KEY.
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL of the remote tool server, overriding configuration.
    #[arg(long, global = true)]
    mcp_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one message and print the reply.
    Ask {
        /// The message; several words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Detailed answer with a larger token budget.
        #[arg(long)]
        full: bool,
        /// Dispatch on the background worker pool.
        #[arg(long = "async")]
        background: bool,
    },
    /// Launch an interactive REPL session.
    Shell {
        /// Detailed answers with a larger token budget.
        #[arg(long)]
        full: bool,
    },
    /// Validate configuration and print the effective settings.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match odoobot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            odoobot_config::render_errors(&errors);
            println!("{ERROR_MARKER} missing configuration");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.chatbot.log_level);

    let overrides = Overrides {
        api_key: cli.api_key,
        mcp_url: cli.mcp_url,
    };

    let result = match cli.command {
        Some(Commands::Ask {
            message,
            full,
            background,
        }) => {
            let caller = Caller::new(&config, overrides);
            run_ask(&caller, &message.join(" "), mode_flag(full), background).await
        }
        Some(Commands::Shell { full }) => {
            let caller = Caller::new(&config, overrides);
            shell::run_shell(&caller, &config.chatbot.name, mode_flag(full))
                .await
                .map(|()| ExitCode::SUCCESS)
        }
        Some(Commands::Config) => run_config(&config).map(|()| ExitCode::SUCCESS),
        None => {
            println!("odoobot: use --help for available commands");
            Ok(ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|e| {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })
}

fn mode_flag(full: bool) -> Option<VerbosityMode> {
    full.then_some(VerbosityMode::Full)
}

async fn run_ask(
    caller: &Caller,
    message: &str,
    mode: Option<VerbosityMode>,
    background: bool,
) -> Result<ExitCode, ChatbotError> {
    let (text, is_error) = if background {
        let (tx, rx) = tokio::sync::oneshot::channel();
        caller
            .ask_async(message, mode, move |text, is_error| {
                let _ = tx.send((text, is_error));
            })
            .map_err(|e| ChatbotError::Internal(e.to_string()))?;
        rx.await
            .map_err(|_| ChatbotError::Internal("background dispatch dropped its reply".into()))?
    } else {
        caller.ask(message, mode).await
    };

    println!("{text}");
    Ok(if is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Print the effective configuration with the API key masked.
fn run_config(config: &OdoobotConfig) -> Result<(), ChatbotError> {
    println!("{}", render_config(config)?);
    Ok(())
}

fn render_config(config: &OdoobotConfig) -> Result<String, ChatbotError> {
    let mut shown = config.clone();
    if shown.anthropic.api_key.is_some() {
        shown.anthropic.api_key = Some("********".into());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| ChatbotError::Config(format!("failed to render configuration: {e}")))
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("odoobot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_joins_words_and_reads_flags() {
        let cli = Cli::try_parse_from([
            "odoobot", "ask", "liste", "des", "leads", "--full", "--async", "--mcp-url",
            "https://mcp.example.com",
        ])
        .unwrap();
        assert_eq!(cli.mcp_url.as_deref(), Some("https://mcp.example.com"));
        match cli.command {
            Some(Commands::Ask {
                message,
                full,
                background,
            }) => {
                assert_eq!(message.join(" "), "liste des leads");
                assert!(full);
                assert!(background);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_requires_a_message() {
        assert!(Cli::try_parse_from(["odoobot", "ask"]).is_err());
    }

    #[test]
    fn rendered_config_masks_key() {
        let mut config = OdoobotConfig::default();
        config.anthropic.api_key = Some("sk-ant-secret".into());
        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("sk-ant-secret"));
        assert!(rendered.contains("********"));
        assert!(rendered.contains("odoo-mcp-server"));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = odoobot_config::load_and_validate_str("").unwrap();
        assert_eq!(config.chatbot.name, "Configuration Chatbot");
    }
}
