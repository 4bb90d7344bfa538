//! Statements

use bytecode_system::{BindingKind, Opcode};
use core_types::JsError;

use crate::compiler::Compiler;
use crate::lexer::{Keyword, Punctuator, Token};

impl Compiler {
    /// Compiles one statement. The statement leaves the stack as it found it.
    pub fn parse_statement(&mut self) -> Result<(), JsError> {
        if self.tokens.is_ident("let") && self.is_let_declaration()? {
            return self.parse_declaration(BindingKind::Let);
        }
        match self.tokens.token() {
            Token::Punctuator(Punctuator::LBrace) => self.parse_block(),
            Token::Punctuator(Punctuator::Semicolon) => self.advance(),
            Token::Keyword(Keyword::Var) => self.parse_declaration(BindingKind::Var),
            Token::Keyword(Keyword::Const) => self.parse_declaration(BindingKind::Const),
            Token::Keyword(Keyword::If) => self.parse_if(),
            Token::Keyword(Keyword::Throw) => self.parse_throw(),
            Token::Keyword(Keyword::Return) => self.parse_return(),
            Token::Keyword(Keyword::Try) => self.parse_try(),
            Token::Keyword(Keyword::Function) => self.parse_function_declaration(),
            _ => {
                self.parse_expression(true)?;
                self.emit(Opcode::Drop);
                self.consume_semicolon()
            }
        }
    }

    fn parse_declaration(&mut self, kind: BindingKind) -> Result<(), JsError> {
        self.advance()?;
        self.parse_var(kind, true)?;
        self.consume_semicolon()
    }

    /// `let` starts a declaration when a binding follows it; otherwise it
    /// is an identifier.
    fn is_let_declaration(&mut self) -> Result<bool, JsError> {
        if self.is_strict() {
            return Ok(true);
        }
        let saved = self.tokens.save_position();
        let advanced = self.advance();
        let declaration = advanced.is_ok()
            && matches!(
                self.tokens.token(),
                Token::Identifier(_)
                    | Token::Punctuator(Punctuator::LBracket | Punctuator::LBrace)
            );
        self.tokens.restore_position(saved);
        Ok(declaration)
    }

    /// Body of `if`/`else`; declarations need a block there.
    fn parse_substatement(&mut self) -> Result<(), JsError> {
        let lexical = self.tokens.is_keyword(Keyword::Const)
            || (self.tokens.is_ident("let") && self.is_let_declaration()?);
        if lexical {
            return Err(self.error("lexical declarations can't appear in single-statement context"));
        }
        if self.tokens.is_keyword(Keyword::Function) {
            return Err(self.error("function declarations can't appear in single-statement context"));
        }
        self.parse_statement()
    }

    fn parse_block(&mut self) -> Result<(), JsError> {
        self.advance()?;
        let scope = self.unit.scopes.push_scope();
        self.emit(Opcode::EnterScope(scope));
        while !self.tokens.is_punct(Punctuator::RBrace) {
            if *self.tokens.token() == Token::EOF {
                return Err(self.unexpected("'}'"));
            }
            self.parse_statement()?;
        }
        self.emit(Opcode::LeaveScope(scope));
        self.unit.scopes.pop_scope();
        self.advance()
    }

    fn parse_if(&mut self) -> Result<(), JsError> {
        self.advance()?;
        self.tokens.expect_punct(Punctuator::LParen)?;
        self.parse_expression(true)?;
        self.tokens.expect_punct(Punctuator::RParen)?;
        let otherwise = self.unit.chunk.emit_goto(Opcode::IfFalse);
        self.parse_substatement()?;
        if self.tokens.is_keyword(Keyword::Else) {
            let end = self.unit.chunk.emit_goto(Opcode::Goto);
            self.unit.chunk.emit_label(otherwise);
            self.advance()?;
            self.parse_substatement()?;
            self.unit.chunk.emit_label(end);
        } else {
            self.unit.chunk.emit_label(otherwise);
        }
        Ok(())
    }

    fn parse_throw(&mut self) -> Result<(), JsError> {
        self.advance()?;
        if self.tokens.current().newline_before {
            return Err(self.error("line terminator not allowed after throw"));
        }
        self.parse_expression(true)?;
        self.emit(Opcode::Throw);
        self.consume_semicolon()
    }

    fn parse_return(&mut self) -> Result<(), JsError> {
        if !self.unit.is_function {
            return Err(self.error("return not in a function"));
        }
        self.advance()?;
        let bare = self.tokens.is_punct(Punctuator::Semicolon)
            || self.tokens.is_punct(Punctuator::RBrace)
            || *self.tokens.token() == Token::EOF
            || self.tokens.current().newline_before;
        if bare {
            self.emit(Opcode::PushUndefined);
        } else {
            self.parse_expression(true)?;
        }
        self.emit(Opcode::Return);
        self.consume_semicolon()
    }

    /// `try {...} catch [(binding)] {...}`. The binding and the catch body
    /// share one scope so the body cannot redeclare the binding lexically.
    fn parse_try(&mut self) -> Result<(), JsError> {
        self.advance()?;
        if !self.tokens.is_punct(Punctuator::LBrace) {
            return Err(self.unexpected("'{'"));
        }
        let handler = self.unit.chunk.emit_goto(Opcode::Catch);
        self.parse_block()?;
        // catch offset
        self.emit(Opcode::Drop);
        let end = self.unit.chunk.emit_goto(Opcode::Goto);

        self.unit.chunk.emit_label(handler);
        if !self.tokens.is_keyword(Keyword::Catch) {
            return Err(self.unexpected("'catch'"));
        }
        self.advance()?;
        let scope = self.unit.scopes.push_scope();
        self.emit(Opcode::EnterScope(scope));
        if self.tokens.is_punct(Punctuator::LParen) {
            self.advance()?;
            self.parse_catch_binding()?;
            self.tokens.expect_punct(Punctuator::RParen)?;
        } else {
            self.emit(Opcode::Drop);
        }
        if !self.tokens.is_punct(Punctuator::LBrace) {
            return Err(self.unexpected("'{'"));
        }
        self.advance()?;
        while !self.tokens.is_punct(Punctuator::RBrace) {
            if *self.tokens.token() == Token::EOF {
                return Err(self.unexpected("'}'"));
            }
            self.parse_statement()?;
        }
        self.emit(Opcode::LeaveScope(scope));
        self.unit.scopes.pop_scope();
        self.advance()?;
        self.unit.chunk.emit_label(end);
        Ok(())
    }
}
