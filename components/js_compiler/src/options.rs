//! Compiler configuration

/// Options for one compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Compile the script as strict mode code from the first token
    pub strict: bool,
    /// Run the stack verifier over the finished bytecode
    pub verify_stack: bool,
    /// Name reported in diagnostics
    pub source_name: Option<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            strict: false,
            verify_stack: true,
            source_name: None,
        }
    }
}

impl CompilerOptions {
    /// Sets strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables stack verification.
    pub fn with_verify_stack(mut self, verify: bool) -> Self {
        self.verify_stack = verify;
        self
    }

    /// Sets the source name used in diagnostics.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}
