//! Single-pass compiler driver
//!
//! [`Compiler`] owns the token stream and the unit being emitted. Parsing
//! and code generation happen together: every `parse_*` method consumes
//! tokens and emits the code for what it consumed.

use bytecode_system::{verify_stack, Bytecode, FunctionFlags, Opcode};
use core_types::JsError;
use tracing::{debug, debug_span, trace};

use crate::error::{syntax_error, unexpected_token};
use crate::lexer::{Punctuator, Token};
use crate::options::CompilerOptions;
use crate::scanner::{scan_balanced, ScanOutcome};
use crate::token_stream::{is_reserved_ident, TokenStream};
use crate::unit::CompilationUnit;

/// Compiler state for one source text
pub struct Compiler {
    pub(crate) tokens: TokenStream,
    pub(crate) unit: CompilationUnit,
    options: CompilerOptions,
}

impl Compiler {
    /// Creates a compiler positioned on the first token of `source`.
    pub fn new(source: &str, options: &CompilerOptions) -> Result<Self, JsError> {
        let tokens = TokenStream::new(source)?;
        let flags = FunctionFlags {
            strict: options.strict,
            generator: false,
            simple_parameters: true,
        };
        Ok(Self {
            tokens,
            unit: CompilationUnit::new(None, flags),
            options: options.clone(),
        })
    }

    /// Compiles the whole source as a script.
    pub fn compile_script(mut self) -> Result<Bytecode, JsError> {
        let source_name = self
            .options
            .source_name
            .clone()
            .unwrap_or_else(|| "<input>".to_string());
        let span = debug_span!("compile_script", source = %source_name);
        let _guard = span.enter();

        self.parse_directives()?;
        while *self.tokens.token() != Token::EOF {
            self.parse_statement()?;
        }
        self.emit(Opcode::PushUndefined);
        self.emit(Opcode::Return);

        let verify = self.options.verify_stack;
        let code = self.unit.finish()?;
        if verify {
            let report = verify_stack(&code)?;
            debug!(max_depth = report.max_depth, "stack verified");
        }
        debug!(
            instructions = code.instructions.len(),
            functions = code.functions.len(),
            strict = code.flags.strict,
            "script compiled"
        );
        Ok(code)
    }

    /// Scans the balanced group starting at the current `(`, `[` or `{`
    /// and reports what follows it. The stream is left where it was.
    pub fn skip_parens_token(&mut self, no_line_terminator: bool) -> ScanOutcome {
        scan_balanced(&mut self.tokens, no_line_terminator)
    }

    pub(crate) fn emit(&mut self, opcode: Opcode) {
        let position = self.tokens.position();
        self.unit.chunk.set_position(position);
        self.unit.emit(opcode);
    }

    pub(crate) fn advance(&mut self) -> Result<(), JsError> {
        self.tokens.advance()
    }

    /// Syntax error at the current token
    pub(crate) fn error(&self, message: impl Into<String>) -> JsError {
        syntax_error(message, Some(self.tokens.position()))
    }

    pub(crate) fn unexpected(&self, expected: &str) -> JsError {
        unexpected_token(
            expected,
            &self.tokens.token().describe(),
            Some(self.tokens.position()),
        )
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.unit.flags.strict
    }

    pub(crate) fn is_generator(&self) -> bool {
        self.unit.flags.generator
    }

    /// Whether `name` cannot be bound in the current mode
    pub(crate) fn is_reserved(&self, name: &str) -> bool {
        is_reserved_ident(name, self.is_strict(), self.is_generator())
    }

    /// Runs `f` with one more iterator record counted as open.
    pub(crate) fn with_iterator_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, JsError>,
    ) -> Result<T, JsError> {
        self.unit.enter_iterator_scope();
        let result = f(self);
        self.unit.leave_iterator_scope();
        result
    }

    /// Makes `unit` the emission target and returns the previous one.
    pub(crate) fn enter_unit(&mut self, unit: CompilationUnit) -> CompilationUnit {
        std::mem::replace(&mut self.unit, unit)
    }

    /// Restores `parent` and returns the unit compiled in between.
    pub(crate) fn leave_unit(&mut self, parent: CompilationUnit) -> CompilationUnit {
        std::mem::replace(&mut self.unit, parent)
    }

    /// Consumes a statement terminator, inserting one where a line break,
    /// `}` or the end of input allows it.
    pub(crate) fn consume_semicolon(&mut self) -> Result<(), JsError> {
        if self.tokens.is_punct(Punctuator::Semicolon) {
            return self.advance();
        }
        if self.tokens.is_punct(Punctuator::RBrace)
            || *self.tokens.token() == Token::EOF
            || self.tokens.current().newline_before
        {
            return Ok(());
        }
        Err(self.unexpected("';'"))
    }

    /// Directive prologue at the start of a script or function body.
    /// `"use strict"` switches the unit to strict mode.
    pub(crate) fn parse_directives(&mut self) -> Result<(), JsError> {
        while let Token::String(value) = self.tokens.token().clone() {
            let saved = self.tokens.save_position();
            self.advance()?;
            let ends_statement = self.tokens.is_punct(Punctuator::Semicolon)
                || self.tokens.is_punct(Punctuator::RBrace)
                || *self.tokens.token() == Token::EOF
                || self.tokens.current().newline_before;
            if !ends_statement {
                self.tokens.restore_position(saved);
                break;
            }
            if value == "use strict" {
                if !self.unit.flags.simple_parameters {
                    return Err(self.error(
                        "\"use strict\" not allowed in function with default or destructuring parameter",
                    ));
                }
                trace!(function = ?self.unit.name, "strict mode directive");
                self.unit.flags.strict = true;
            }
            self.consume_semicolon()?;
        }
        Ok(())
    }
}
