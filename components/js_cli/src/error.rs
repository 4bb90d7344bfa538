//! Error types for the CLI

use core_types::JsError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Source could not be compiled
    #[error("{}", .0.describe())]
    Compile(#[from] JsError),

    /// Input file could not be read
    #[error("could not read '{path}': {source}")]
    Io {
        /// Path given on the command line
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Bytecode could not be serialized
    #[error("could not serialize bytecode: {0}")]
    Json(#[from] serde_json::Error),

    /// Line editor failure
    #[error("REPL error: {0}")]
    Repl(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
