//! `var`, `let` and `const` declarations

use bytecode_system::{BindingKind, Opcode};
use core_types::JsError;
use tracing::trace;

use crate::compiler::Compiler;
use crate::lexer::Punctuator;
use crate::lvalue::{PutMode, TargetContext};
use crate::pattern::PatternRequest;

impl Compiler {
    /// Compiles the declarator list after `var`, `let` or `const`, up to but
    /// not including the terminator.
    ///
    /// `in_accepted` is false in a `for` head where `in` ends an
    /// initializer.
    pub fn parse_var(&mut self, kind: BindingKind, in_accepted: bool) -> Result<(), JsError> {
        loop {
            if let Some(name) = self.tokens.ident_name().map(str::to_string) {
                if self.is_reserved(&name) {
                    return Err(self.error(format!("'{}' is a reserved identifier", name)));
                }
                if name == "let" && kind.is_lexical() {
                    return Err(self.error("'let' is not a valid lexical identifier"));
                }
                self.advance()?;
                self.define_var(&name, kind)?;
                self.parse_var_initializer(name, kind, in_accepted)?;
            } else if self.tokens.is_punct(Punctuator::LBracket)
                || self.tokens.is_punct(Punctuator::LBrace)
            {
                let scan = self.skip_parens_token(false);
                if !scan.follow.is_punct(Punctuator::Assign) {
                    return Err(self.error("variable name expected"));
                }
                self.emit(Opcode::PushUndefined);
                self.compile_pattern(PatternRequest::declaration(kind).with_rest_hint(scan.hints))?;
            } else {
                return Err(self.error("variable name expected"));
            }

            if !self.tokens.is_punct(Punctuator::Comma) {
                return Ok(());
            }
            self.advance()?;
        }
    }

    fn parse_var_initializer(
        &mut self,
        name: String,
        kind: BindingKind,
        in_accepted: bool,
    ) -> Result<(), JsError> {
        let scope = self.unit.scope();
        if self.tokens.is_punct(Punctuator::Assign) {
            self.advance()?;
            if kind == BindingKind::Var {
                // the binding is resolved before the initializer runs
                self.emit(Opcode::ScopeGetVar {
                    name: name.clone(),
                    scope,
                });
                let lvalue = self.get_lvalue(TargetContext::Assignment)?;
                self.parse_assign_expr(in_accepted)?;
                self.set_object_name(&name);
                self.put_lvalue(&lvalue, PutMode::NoKeepDepth, false);
            } else {
                self.parse_assign_expr(in_accepted)?;
                self.set_object_name(&name);
                self.emit(Opcode::ScopePutVarInit { name, scope });
            }
            return Ok(());
        }
        match kind {
            BindingKind::Const => Err(self.error("missing initializer for const variable")),
            BindingKind::Let => {
                self.emit(Opcode::PushUndefined);
                self.emit(Opcode::ScopePutVarInit { name, scope });
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Registers a binding after the checks every declaration form shares.
    pub fn define_var(&mut self, name: &str, kind: BindingKind) -> Result<(), JsError> {
        if name == "yield" && self.is_generator() {
            return Err(self.error("yield is a reserved identifier"));
        }
        if self.is_strict() && (name == "eval" || name == "arguments") {
            return Err(self.error("invalid variable name in strict mode"));
        }
        if kind.is_lexical() && (name == "let" || name == "undefined") {
            return Err(self.error("invalid lexical variable name"));
        }
        let position = self.tokens.position();
        trace!(name, kind = kind.keyword(), scope = %self.unit.scope(), "define");
        self.unit
            .scopes
            .define(name, kind, &self.unit.params, Some(position))
    }

    /// Binding of a `catch (...)` clause. The exception is on the stack and
    /// is consumed. Stops on the closing `)`.
    pub fn parse_catch_binding(&mut self) -> Result<(), JsError> {
        if let Some(name) = self.tokens.ident_name().map(str::to_string) {
            if self.is_reserved(&name) {
                return Err(self.error(format!("'{}' is a reserved identifier", name)));
            }
            self.advance()?;
            self.define_var(&name, BindingKind::Catch)?;
            let scope = self.unit.scope();
            self.emit(Opcode::ScopePutVar { name, scope });
            return Ok(());
        }
        if self.tokens.is_punct(Punctuator::LBracket) || self.tokens.is_punct(Punctuator::LBrace) {
            let request = PatternRequest::declaration(BindingKind::Catch).with_initializer(false);
            self.compile_pattern(request)?;
            return Ok(());
        }
        Err(self.error("identifier expected"))
    }
}
