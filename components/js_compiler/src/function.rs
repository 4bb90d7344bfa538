//! Function declarations, expressions and object literal methods
//!
//! Each function is compiled into its own [`CompilationUnit`] while the
//! enclosing unit is parked; the finished bytecode becomes a child of the
//! enclosing unit and is referenced by index from `fclosure`.

use bytecode_system::{BindingKind, FunctionFlags, Opcode};
use core_types::JsError;
use tracing::debug;

use crate::compiler::Compiler;
use crate::lexer::{Punctuator, Token};
use crate::params::check_parameter_names;
use crate::unit::CompilationUnit;

impl Compiler {
    /// `function name(...) {...}` as a statement. The binding is assigned
    /// where the declaration appears.
    pub(crate) fn parse_function_declaration(&mut self) -> Result<(), JsError> {
        self.advance()?;
        let generator = self.eat_star()?;
        let name = match self.tokens.ident_name() {
            Some(name) => name.to_string(),
            None => return Err(self.error("function name expected")),
        };
        if self.is_reserved(&name) {
            return Err(self.error(format!("'{}' is a reserved identifier", name)));
        }
        self.advance()?;
        self.define_var(&name, BindingKind::Function)?;

        let index = self.compile_function(Some(name.clone()), generator, false)?;
        self.emit(Opcode::FClosure(index));
        let scope = self.unit.scope();
        self.emit(Opcode::ScopePutVar { name, scope });
        Ok(())
    }

    /// `function [name](...) {...}` in expression position
    pub(crate) fn parse_function_expression(&mut self) -> Result<(), JsError> {
        self.advance()?;
        let generator = self.eat_star()?;
        let name = match self.tokens.ident_name() {
            Some(name) => {
                let name = name.to_string();
                self.advance()?;
                Some(name)
            }
            None => None,
        };
        let index = self.compile_function(name, generator, false)?;
        self.emit(Opcode::FClosure(index));
        Ok(())
    }

    /// `name(...) {...}` inside an object literal, with the object on the
    /// stack. `obj -- obj method`
    pub(crate) fn parse_method(&mut self, name: String) -> Result<(), JsError> {
        let index = self.compile_function(Some(name), false, true)?;
        self.emit(Opcode::FClosure(index));
        self.emit(Opcode::SetHomeObject);
        Ok(())
    }

    /// Gives the anonymous function whose closure was just emitted the
    /// name of the binding it initializes.
    pub(crate) fn set_object_name(&mut self, name: &str) {
        let Some(Opcode::FClosure(index)) = self.unit.chunk.last_opcode().cloned() else {
            return;
        };
        if let Some(function) = self.unit.functions.get_mut(index) {
            if function.name.is_none() {
                function.name = Some(name.to_string());
            }
        }
    }

    fn eat_star(&mut self) -> Result<bool, JsError> {
        if self.tokens.is_punct(Punctuator::Star) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn compile_function(
        &mut self,
        name: Option<String>,
        generator: bool,
        is_method: bool,
    ) -> Result<usize, JsError> {
        let flags = FunctionFlags {
            strict: self.is_strict(),
            generator,
            simple_parameters: true,
        };
        let mut unit = CompilationUnit::new(name, flags);
        unit.is_function = true;
        unit.allows_super = is_method;

        let parent = self.enter_unit(unit);
        let result = self.parse_function_rest();
        let child = self.leave_unit(parent);
        result?;

        let code = child.finish()?;
        debug!(
            name = code.name.as_deref().unwrap_or("<anonymous>"),
            params = code.params.len(),
            instructions = code.instructions.len(),
            "function compiled"
        );
        self.unit.functions.push(code);
        Ok(self.unit.functions.len() - 1)
    }

    /// Parameter list and body of the function in `self.unit`
    fn parse_function_rest(&mut self) -> Result<(), JsError> {
        self.tokens.expect_punct(Punctuator::LParen)?;
        self.parse_parameters()?;
        if !self.tokens.is_punct(Punctuator::LBrace) {
            return Err(self.unexpected("'{'"));
        }
        let body_position = self.tokens.position();
        self.advance()?;
        self.parse_directives()?;
        check_parameter_names(&self.unit).map_err(|err| err.with_position(body_position))?;

        while !self.tokens.is_punct(Punctuator::RBrace) {
            if *self.tokens.token() == Token::EOF {
                return Err(self.unexpected("'}'"));
            }
            self.parse_statement()?;
        }
        self.emit(Opcode::PushUndefined);
        self.emit(Opcode::Return);
        self.advance()
    }
}
