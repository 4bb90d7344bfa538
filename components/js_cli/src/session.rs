//! Compile-and-print pipeline shared by every input mode

use bytecode_system::Bytecode;
use js_compiler::{compile_script, CompilerOptions};
use tracing::{debug, info};

use crate::cli::{Cli, OutputFormat};
use crate::error::{CliError, CliResult};

/// Compiler options plus the chosen output format
#[derive(Debug, Clone)]
pub struct Session {
    options: CompilerOptions,
    format: OutputFormat,
}

impl Session {
    /// Create a session with default options and text output
    pub fn new() -> Self {
        Self {
            options: CompilerOptions::default(),
            format: OutputFormat::Text,
        }
    }

    /// Builds a session from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new()
            .with_strict(cli.strict)
            .with_verify_stack(!cli.no_verify)
            .with_format(cli.format)
    }

    /// Sets strict mode for every compilation
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.options = self.options.with_strict(strict);
        self
    }

    /// Enables or disables stack verification
    pub fn with_verify_stack(mut self, verify: bool) -> Self {
        self.options = self.options.with_verify_stack(verify);
        self
    }

    /// Sets the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Whether sources are compiled as strict mode code
    pub fn is_strict(&self) -> bool {
        self.options.strict
    }

    /// Current output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Compiles a source string.
    pub fn compile_source(&self, source: &str) -> CliResult<Bytecode> {
        Ok(compile_script(source, &self.options)?)
    }

    /// Reads and compiles a file.
    pub fn compile_file(&self, path: &str) -> CliResult<Bytecode> {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        })?;
        info!(path, bytes = source.len(), "compiling file");
        let options = self.options.clone().with_source_name(path);
        Ok(compile_script(&source, &options)?)
    }

    /// Formats compiled bytecode in the session's output format.
    pub fn render(&self, code: &Bytecode) -> CliResult<String> {
        let text = match self.format {
            OutputFormat::Text => code.to_string(),
            OutputFormat::Json => serde_json::to_string_pretty(code)?,
        };
        debug!(format = ?self.format, len = text.len(), "rendered bytecode");
        Ok(text)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
