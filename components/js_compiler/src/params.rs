//! Formal parameter lists and duplicate parameter detection

use bytecode_system::{BindingKind, Opcode};
use core_types::JsError;

use crate::compiler::Compiler;
use crate::error::syntax_error;
use crate::lexer::Punctuator;
use crate::pattern::PatternRequest;
use crate::unit::CompilationUnit;

const DUPLICATE_PARAMETER: &str = "duplicate parameter names not allowed in this context";

/// Fails when `name` is already a parameter of `unit` or a binding created
/// by an earlier destructured parameter.
pub fn check_duplicate_parameter(unit: &CompilationUnit, name: &str) -> Result<(), JsError> {
    if unit.params.iter().any(|p| p == name) || unit.scopes.find_var(name) {
        return Err(syntax_error(DUPLICATE_PARAMETER, None));
    }
    Ok(())
}

/// Checks the plain identifier parameters once the function's mode is known.
///
/// Destructured parameters were checked as their leaves were parsed. Plain
/// names may repeat in sloppy functions with a simple parameter list.
pub(crate) fn check_parameter_names(unit: &CompilationUnit) -> Result<(), JsError> {
    let strict = unit.flags.strict;
    if !strict && unit.flags.simple_parameters {
        return Ok(());
    }
    for (idx, name) in unit.params.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        if strict && (name == "eval" || name == "arguments") {
            return Err(syntax_error("invalid argument name in strict mode", None));
        }
        if unit.params[..idx].contains(name) || unit.scopes.find_var(name) {
            return Err(syntax_error(DUPLICATE_PARAMETER, None));
        }
    }
    Ok(())
}

impl Compiler {
    /// Compiles the parameter list after `(` through the closing `)`.
    ///
    /// Defaults and patterns run in order on entry, each reading its
    /// argument slot and writing the final value back.
    pub(crate) fn parse_parameters(&mut self) -> Result<(), JsError> {
        while !self.tokens.is_punct(Punctuator::RParen) {
            let index = self.unit.params.len() as u16;
            let is_rest = self.tokens.is_punct(Punctuator::Ellipsis);
            if is_rest {
                self.advance()?;
            }

            if let Some(name) = self.tokens.ident_name().map(str::to_string) {
                if self.is_reserved(&name) {
                    return Err(self.error(format!("'{}' is a reserved identifier", name)));
                }
                self.advance()?;
                self.unit.params.push(name);
                if is_rest {
                    self.unit.flags.simple_parameters = false;
                    self.emit(Opcode::Rest(index));
                    self.emit(Opcode::PutArg(index));
                } else if self.tokens.is_punct(Punctuator::Assign) {
                    self.unit.flags.simple_parameters = false;
                    self.compile_parameter_default(index)?;
                }
            } else if self.tokens.is_punct(Punctuator::LBracket)
                || self.tokens.is_punct(Punctuator::LBrace)
            {
                self.unit.flags.simple_parameters = false;
                self.unit.params.push(String::new());
                self.emit(if is_rest {
                    Opcode::Rest(index)
                } else {
                    Opcode::GetArg(index)
                });
                let request = PatternRequest::declaration(BindingKind::Var)
                    .parameter()
                    .with_initializer(!is_rest);
                self.compile_pattern(request)?;
            } else {
                return Err(self.error("missing formal parameter"));
            }

            if is_rest && !self.tokens.is_punct(Punctuator::RParen) {
                return Err(self.error("rest parameter must be last"));
            }
            if self.tokens.is_punct(Punctuator::RParen) {
                break;
            }
            self.tokens.expect_punct(Punctuator::Comma)?;
        }
        self.advance()
    }

    fn compile_parameter_default(&mut self, index: u16) -> Result<(), JsError> {
        self.advance()?;
        self.emit(Opcode::GetArg(index));
        self.emit(Opcode::Dup);
        self.emit(Opcode::PushUndefined);
        self.emit(Opcode::StrictEq);
        let supplied = self.unit.chunk.emit_goto(Opcode::IfFalse);
        self.emit(Opcode::Drop);
        self.parse_assign_expr(true)?;
        self.unit.chunk.emit_label(supplied);
        self.emit(Opcode::PutArg(index));
        Ok(())
    }
}
