// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `odoobot shell` command implementation.
//!
//! Interactive REPL with a colored prompt and readline history. Every line
//! is an independent chat turn; `/clear` wipes the screen and history.

use colored::Colorize;
use odoobot_core::{ChatbotError, VerbosityMode};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::caller::Caller;

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum ShellInput<'a> {
    Quit,
    Clear,
    Empty,
    Message(&'a str),
}

fn parse_line(line: &str) -> ShellInput<'_> {
    match line.trim() {
        "/quit" | "/exit" => ShellInput::Quit,
        "/clear" => ShellInput::Clear,
        "" => ShellInput::Empty,
        message => ShellInput::Message(message),
    }
}

/// Runs the `odoobot shell` interactive REPL.
pub async fn run_shell(
    caller: &Caller,
    name: &str,
    mode: Option<VerbosityMode>,
) -> Result<(), ChatbotError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| ChatbotError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", name.bold().green());
    if caller.tool_configured() {
        println!("{}", "tool server configured".dimmed());
    }
    println!(
        "Type {} to exit, {} to start over.\n",
        "/quit".yellow(),
        "/clear".yellow()
    );

    let prompt = format!("{}> ", "odoobot".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => match parse_line(&line) {
                ShellInput::Quit => break,
                ShellInput::Empty => continue,
                ShellInput::Clear => {
                    let _ = rl.clear_history();
                    let _ = rl.clear_screen();
                    debug!("shell conversation cleared");
                }
                ShellInput::Message(message) => {
                    let _ = rl.add_history_entry(message);
                    let (text, is_error) = caller.ask(message, mode).await;
                    if is_error {
                        eprintln!("{}", text.red());
                    } else {
                        println!("{text}\n");
                    }
                }
            },
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}
