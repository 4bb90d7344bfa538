//! Interactive session: each complete input is compiled and its bytecode
//! printed

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::session::Session;

/// What the loop does after a dot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Keep reading input
    Continue,
    /// Leave the loop
    Exit,
}

/// Runs the loop until `.exit` or end of input.
pub fn run_repl(session: &mut Session) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("failed to initialize editor: {}", e)))?;

    println!("corten-jsc {}", env!("CARGO_PKG_VERSION"));
    println!("Type declarations to see their bytecode, .help for commands.");

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "> " } else { "... " };
        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if buffer.is_empty() && trimmed.starts_with('.') {
                    if handle_command(trimmed, session) == Command::Exit {
                        break;
                    }
                    continue;
                }

                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                if !is_input_complete(&buffer) {
                    continue;
                }

                let _ = editor.add_history_entry(buffer.as_str());
                match evaluate(session, &buffer) {
                    Ok(listing) => println!("{}", listing),
                    Err(err) => eprintln!("{}", err),
                }
                buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                if buffer.is_empty() {
                    println!("Press Ctrl-D or type .exit to quit");
                } else {
                    println!("^C");
                    buffer.clear();
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(CliError::Repl(format!("readline error: {}", err))),
        }
    }
    Ok(())
}

/// Compiles one complete input and renders it.
pub fn evaluate(session: &Session, input: &str) -> CliResult<String> {
    debug!(len = input.len(), "repl input");
    let code = session.compile_source(input)?;
    session.render(&code)
}

/// Applies a dot command to the session.
pub fn handle_command(command: &str, session: &mut Session) -> Command {
    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (Some(".exit"), _) => return Command::Exit,
        (Some(".help"), _) => {
            println!("Commands:");
            println!("  .help            Show this message");
            println!("  .strict [on|off] Show or set strict mode");
            println!("  .format [text|json]  Show or set the output format");
            println!("  .exit            Leave the session");
        }
        (Some(".strict"), arg) => {
            match arg {
                Some("on") => *session = session.clone().with_strict(true),
                Some("off") => *session = session.clone().with_strict(false),
                Some(other) => println!("expected 'on' or 'off', got '{}'", other),
                None => {}
            }
            println!("strict mode: {}", if session.is_strict() { "on" } else { "off" });
        }
        (Some(".format"), arg) => {
            match arg {
                Some("text") => *session = session.clone().with_format(OutputFormat::Text),
                Some("json") => *session = session.clone().with_format(OutputFormat::Json),
                Some(other) => println!("expected 'text' or 'json', got '{}'", other),
                None => {}
            }
            println!("format: {:?}", session.format());
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type .help for available commands");
        }
    }
    Command::Continue
}

/// Balanced brackets outside string and template literals.
pub fn is_input_complete(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match quote {
            Some(q) => {
                if c == '\\' {
                    escape_next = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' | '`' => quote = Some(c),
                '{' | '[' | '(' => depth += 1,
                '}' | ']' | ')' => depth -= 1,
                _ => {}
            },
        }
    }
    depth <= 0 && quote.is_none()
}
