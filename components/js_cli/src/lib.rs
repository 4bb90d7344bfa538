//! Command-line front end for the destructuring compiler
//!
//! Compiles a file, an inline snippet or interactive input and prints the
//! resulting bytecode as a disassembly listing or as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod repl;
pub mod session;

pub use cli::{Cli, OutputFormat};
pub use error::{CliError, CliResult};
pub use session::Session;
