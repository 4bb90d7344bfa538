//! Command-line arguments

use clap::{Parser, ValueEnum};

/// How compiled bytecode is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Disassembly listing
    #[default]
    Text,
    /// Serialized bytecode
    Json,
}

/// Compile JavaScript declarations and destructuring to bytecode
#[derive(Debug, Parser)]
#[command(name = "corten-jsc", version, about)]
pub struct Cli {
    /// JavaScript file to compile
    #[arg(short, long, conflicts_with = "eval")]
    pub file: Option<String>,

    /// Inline source to compile
    #[arg(short, long)]
    pub eval: Option<String>,

    /// Start an interactive session
    #[arg(short, long)]
    pub repl: bool,

    /// Compile as strict mode code
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip stack depth verification
    #[arg(long)]
    pub no_verify: bool,
}
