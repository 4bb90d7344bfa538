//! Expressions
//!
//! Binary operators are parsed by precedence level, lowest first. Every
//! expression leaves exactly one value on the stack.

use bytecode_system::{format_number, LabelId, Opcode, Value};
use core_types::JsError;

use crate::compiler::Compiler;
use crate::error::internal_error;
use crate::lexer::{Keyword, Punctuator, Token};
use crate::lvalue::{PutMode, TargetContext};
use crate::pattern::PatternRequest;

/// Highest binary precedence level (multiplicative)
const MAX_BINARY_LEVEL: u8 = 4;

fn binary_operator(token: &Token, in_accepted: bool) -> Option<(u8, Opcode)> {
    let entry = match token {
        Token::Punctuator(p) => match p {
            Punctuator::EqEq => (1, Opcode::Eq),
            Punctuator::NotEq => (1, Opcode::Neq),
            Punctuator::EqEqEq => (1, Opcode::StrictEq),
            Punctuator::NotEqEq => (1, Opcode::StrictNeq),
            Punctuator::Lt => (2, Opcode::Lt),
            Punctuator::LtEq => (2, Opcode::Lte),
            Punctuator::Gt => (2, Opcode::Gt),
            Punctuator::GtEq => (2, Opcode::Gte),
            Punctuator::Plus => (3, Opcode::Add),
            Punctuator::Minus => (3, Opcode::Sub),
            Punctuator::Star => (4, Opcode::Mul),
            Punctuator::Slash => (4, Opcode::Div),
            Punctuator::Percent => (4, Opcode::Mod),
            _ => return None,
        },
        Token::Keyword(Keyword::Instanceof) => (2, Opcode::Instanceof),
        Token::Keyword(Keyword::In) if in_accepted => (2, Opcode::In),
        _ => return None,
    };
    Some(entry)
}

enum LiteralKey {
    Named(String),
    Computed,
}

impl Compiler {
    /// Comma expression.
    pub fn parse_expression(&mut self, in_accepted: bool) -> Result<(), JsError> {
        self.parse_assign_expr(in_accepted)?;
        while self.tokens.is_punct(Punctuator::Comma) {
            self.advance()?;
            self.emit(Opcode::Drop);
            self.parse_assign_expr(in_accepted)?;
        }
        Ok(())
    }

    /// Assignment expression, including destructuring assignment and
    /// `yield` inside generators.
    pub fn parse_assign_expr(&mut self, in_accepted: bool) -> Result<(), JsError> {
        if self.is_generator() && self.tokens.is_ident("yield") {
            return self.parse_yield(in_accepted);
        }
        if self.tokens.is_punct(Punctuator::LBracket) || self.tokens.is_punct(Punctuator::LBrace) {
            let scan = self.skip_parens_token(false);
            if scan.follow.is_punct(Punctuator::Assign) {
                self.compile_pattern(PatternRequest::assignment().with_rest_hint(scan.hints))?;
                return Ok(());
            }
        }

        self.parse_conditional(in_accepted)?;
        if self.tokens.is_punct(Punctuator::Assign) {
            let lvalue = self.get_lvalue(TargetContext::Assignment)?;
            self.advance()?;
            self.parse_assign_expr(in_accepted)?;
            self.put_lvalue(&lvalue, PutMode::KeepTop, false);
        }
        Ok(())
    }

    /// `yield [expr]`. A generator resumed with a return completion closes
    /// every iterator record the enclosing patterns hold before returning.
    fn parse_yield(&mut self, in_accepted: bool) -> Result<(), JsError> {
        self.advance()?;
        let has_operand = !self.tokens.current().newline_before
            && !matches!(
                self.tokens.token(),
                Token::EOF
                    | Token::Punctuator(
                        Punctuator::RParen
                            | Punctuator::RBracket
                            | Punctuator::RBrace
                            | Punctuator::Comma
                            | Punctuator::Semicolon
                            | Punctuator::Colon
                    )
            );
        if has_operand {
            self.parse_assign_expr(in_accepted)?;
        } else {
            self.emit(Opcode::PushUndefined);
        }

        self.emit(Opcode::Yield);
        let resume = self.unit.chunk.emit_goto(Opcode::IfFalse);
        for _ in 0..self.unit.open_iterator_count() {
            self.emit(Opcode::IteratorCloseReturn);
        }
        self.emit(Opcode::Return);
        self.unit.chunk.emit_label(resume);
        Ok(())
    }

    fn parse_conditional(&mut self, in_accepted: bool) -> Result<(), JsError> {
        self.parse_short_circuit(in_accepted)?;
        if !self.tokens.is_punct(Punctuator::Question) {
            return Ok(());
        }
        self.advance()?;
        let otherwise = self.unit.chunk.emit_goto(Opcode::IfFalse);
        self.parse_assign_expr(true)?;
        let end = self.unit.chunk.emit_goto(Opcode::Goto);
        self.tokens.expect_punct(Punctuator::Colon)?;
        self.unit.chunk.emit_label(otherwise);
        self.parse_assign_expr(in_accepted)?;
        self.unit.chunk.emit_label(end);
        Ok(())
    }

    /// `||` and `??`
    fn parse_short_circuit(&mut self, in_accepted: bool) -> Result<(), JsError> {
        self.parse_logical_and(in_accepted)?;
        loop {
            let nullish = if self.tokens.is_punct(Punctuator::OrOr) {
                false
            } else if self.tokens.is_punct(Punctuator::NullishCoalesce) {
                true
            } else {
                return Ok(());
            };
            self.advance()?;
            self.emit(Opcode::Dup);
            let end = if nullish {
                self.emit(Opcode::IsUndefinedOrNull);
                self.unit.chunk.emit_goto(Opcode::IfFalse)
            } else {
                self.unit.chunk.emit_goto(Opcode::IfTrue)
            };
            self.emit(Opcode::Drop);
            self.parse_logical_and(in_accepted)?;
            self.unit.chunk.emit_label(end);
        }
    }

    fn parse_logical_and(&mut self, in_accepted: bool) -> Result<(), JsError> {
        self.parse_binary(1, in_accepted)?;
        while self.tokens.is_punct(Punctuator::AndAnd) {
            self.advance()?;
            self.emit(Opcode::Dup);
            let end: LabelId = self.unit.chunk.emit_goto(Opcode::IfFalse);
            self.emit(Opcode::Drop);
            self.parse_binary(1, in_accepted)?;
            self.unit.chunk.emit_label(end);
        }
        Ok(())
    }

    fn parse_binary(&mut self, level: u8, in_accepted: bool) -> Result<(), JsError> {
        if level > MAX_BINARY_LEVEL {
            return self.parse_unary();
        }
        self.parse_binary(level + 1, in_accepted)?;
        while let Some((prec, op)) = binary_operator(self.tokens.token(), in_accepted) {
            if prec != level {
                break;
            }
            self.advance()?;
            self.parse_binary(level + 1, in_accepted)?;
            self.emit(op);
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<(), JsError> {
        let op = match self.tokens.token() {
            Token::Punctuator(Punctuator::Minus) => Opcode::Neg,
            Token::Punctuator(Punctuator::Plus) => Opcode::Plus,
            Token::Punctuator(Punctuator::Not) => Opcode::Not,
            Token::Keyword(Keyword::Typeof) => Opcode::Typeof,
            Token::Keyword(Keyword::Void) => {
                self.advance()?;
                self.parse_unary()?;
                self.emit(Opcode::Drop);
                self.emit(Opcode::PushUndefined);
                return Ok(());
            }
            _ => return self.parse_left_hand_side_expr(),
        };
        self.advance()?;
        self.parse_unary()?;
        self.emit(op);
        Ok(())
    }

    /// Primary expression followed by member accesses and calls. The last
    /// instruction emitted is the read [`get_lvalue`](Self::get_lvalue)
    /// inspects.
    pub fn parse_left_hand_side_expr(&mut self) -> Result<(), JsError> {
        self.parse_primary()?;
        loop {
            if self.tokens.is_punct(Punctuator::Dot) {
                self.advance()?;
                let name = self.parse_field_name()?;
                self.emit(Opcode::GetField(name));
            } else if self.tokens.is_punct(Punctuator::LBracket) {
                self.advance()?;
                self.parse_expression(true)?;
                self.tokens.expect_punct(Punctuator::RBracket)?;
                self.emit(Opcode::GetArrayEl);
            } else if self.tokens.is_punct(Punctuator::LParen) {
                self.parse_call()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_field_name(&mut self) -> Result<String, JsError> {
        let name = match self.tokens.token() {
            Token::Identifier(name) => name.clone(),
            Token::Keyword(keyword) => keyword.as_str().to_string(),
            _ => return Err(self.unexpected("field name")),
        };
        self.advance()?;
        Ok(name)
    }

    /// Call with the callee on the stack. A member read becomes a method
    /// call keeping the object as `this`.
    fn parse_call(&mut self) -> Result<(), JsError> {
        let is_method = matches!(
            self.unit.chunk.last_opcode(),
            Some(Opcode::GetField(_) | Opcode::GetArrayEl)
        );
        if is_method {
            match self.unit.chunk.remove_last_opcode() {
                Some(Opcode::GetField(name)) => self.emit(Opcode::GetField2(name)),
                Some(Opcode::GetArrayEl) => self.emit(Opcode::GetArrayEl2),
                _ => {
                    return Err(internal_error(
                        "member read changed before call",
                        Some(self.tokens.position()),
                    ))
                }
            }
        }

        self.advance()?;
        let mut argc: u16 = 0;
        while !self.tokens.is_punct(Punctuator::RParen) {
            if self.tokens.is_punct(Punctuator::Ellipsis) {
                return Err(self.error("spread arguments are not supported"));
            }
            self.parse_assign_expr(true)?;
            argc += 1;
            if self.tokens.is_punct(Punctuator::RParen) {
                break;
            }
            self.tokens.expect_punct(Punctuator::Comma)?;
        }
        self.advance()?;
        self.emit(if is_method {
            Opcode::CallMethod(argc)
        } else {
            Opcode::Call(argc)
        });
        Ok(())
    }

    fn push_constant(&mut self, value: Value) {
        let idx = self.unit.chunk.add_constant(value);
        self.emit(Opcode::PushConst(idx));
    }

    fn emit_number(&mut self, n: f64) {
        let small = n.fract() == 0.0
            && n >= f64::from(i32::MIN)
            && n <= f64::from(i32::MAX)
            && !(n == 0.0 && n.is_sign_negative());
        if small {
            self.emit(Opcode::PushI32(n as i32));
        } else {
            self.push_constant(Value::Number(n));
        }
    }

    fn parse_primary(&mut self) -> Result<(), JsError> {
        match self.tokens.token().clone() {
            Token::Number(n) => {
                self.emit_number(n);
                self.advance()
            }
            Token::BigInt(n) => {
                self.push_constant(Value::BigInt(n));
                self.advance()
            }
            Token::String(s) | Token::TemplateLiteral(s) => {
                self.push_constant(Value::String(s));
                self.advance()
            }
            Token::TemplateHead(head) => self.parse_template(head),
            Token::Punctuator(Punctuator::Slash | Punctuator::SlashEq) => {
                self.tokens.rescan_regexp()?;
                if let Token::RegExp(pattern, flags) = self.tokens.token().clone() {
                    self.push_constant(Value::RegExp { pattern, flags });
                }
                self.advance()
            }
            Token::Identifier(name) => {
                let scope = self.unit.scope();
                self.emit(Opcode::ScopeGetVar { name, scope });
                self.advance()
            }
            Token::Keyword(Keyword::True) => {
                self.emit(Opcode::PushTrue);
                self.advance()
            }
            Token::Keyword(Keyword::False) => {
                self.emit(Opcode::PushFalse);
                self.advance()
            }
            Token::Keyword(Keyword::Null) => {
                self.emit(Opcode::PushNull);
                self.advance()
            }
            Token::Keyword(Keyword::This) => {
                self.emit(Opcode::PushThis);
                self.advance()
            }
            Token::Keyword(Keyword::Function) => self.parse_function_expression(),
            Token::Keyword(Keyword::Super) => self.parse_super_member(),
            Token::Punctuator(Punctuator::LParen) => {
                self.advance()?;
                self.parse_expression(true)?;
                self.tokens.expect_punct(Punctuator::RParen)
            }
            Token::Punctuator(Punctuator::LBracket) => self.parse_array_literal(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_object_literal(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `` `head${e}middle${e}tail` `` concatenated left to right
    fn parse_template(&mut self, head: String) -> Result<(), JsError> {
        self.push_constant(Value::String(head));
        self.advance()?;
        loop {
            self.parse_expression(true)?;
            self.emit(Opcode::Add);
            self.tokens.rescan_template()?;
            let (text, is_tail) = match self.tokens.token().clone() {
                Token::TemplateMiddle(text) => (text, false),
                Token::TemplateTail(text) => (text, true),
                _ => return Err(self.unexpected("template continuation")),
            };
            if !text.is_empty() {
                self.push_constant(Value::String(text));
                self.emit(Opcode::Add);
            }
            self.advance()?;
            if is_tail {
                return Ok(());
            }
        }
    }

    /// `super.name` or `super[expr]` inside a method
    fn parse_super_member(&mut self) -> Result<(), JsError> {
        if !self.unit.allows_super {
            return Err(self.error("'super' is only valid in a method"));
        }
        self.advance()?;
        self.emit(Opcode::PushThis);
        self.emit(Opcode::PushSuperBase);
        if self.tokens.is_punct(Punctuator::Dot) {
            self.advance()?;
            let name = self.parse_field_name()?;
            self.push_constant(Value::String(name));
        } else if self.tokens.is_punct(Punctuator::LBracket) {
            self.advance()?;
            self.parse_expression(true)?;
            self.tokens.expect_punct(Punctuator::RBracket)?;
        } else {
            return Err(self.error("invalid use of 'super'"));
        }
        self.emit(Opcode::GetSuperValue);
        Ok(())
    }

    /// Holes read as `undefined`.
    fn parse_array_literal(&mut self) -> Result<(), JsError> {
        self.advance()?;
        let mut count: u16 = 0;
        while !self.tokens.is_punct(Punctuator::RBracket) {
            if self.tokens.is_punct(Punctuator::Comma) {
                self.emit(Opcode::PushUndefined);
                count += 1;
                self.advance()?;
                continue;
            }
            if self.tokens.is_punct(Punctuator::Ellipsis) {
                return Err(self.error("spread elements are not supported in array literals"));
            }
            self.parse_assign_expr(true)?;
            count += 1;
            if self.tokens.is_punct(Punctuator::RBracket) {
                break;
            }
            self.tokens.expect_punct(Punctuator::Comma)?;
        }
        self.advance()?;
        self.emit(Opcode::ArrayFrom(count));
        Ok(())
    }

    fn parse_object_literal(&mut self) -> Result<(), JsError> {
        self.advance()?;
        self.emit(Opcode::Object);
        while !self.tokens.is_punct(Punctuator::RBrace) {
            if self.tokens.is_punct(Punctuator::Ellipsis) {
                self.advance()?;
                self.parse_assign_expr(true)?;
                // obj src null -- obj
                self.emit(Opcode::PushNull);
                self.emit(Opcode::CopyDataProperties {
                    target: 2,
                    source: 1,
                    exclude: 0,
                });
                self.emit(Opcode::Drop);
                self.emit(Opcode::Drop);
            } else {
                self.parse_object_property()?;
            }
            if self.tokens.is_punct(Punctuator::RBrace) {
                break;
            }
            self.tokens.expect_punct(Punctuator::Comma)?;
        }
        self.advance()
    }

    fn parse_object_property(&mut self) -> Result<(), JsError> {
        let shorthand_candidate = matches!(self.tokens.token(), Token::Identifier(_));
        let key = match self.tokens.token().clone() {
            Token::Identifier(name) => LiteralKey::Named(name),
            Token::Keyword(keyword) => LiteralKey::Named(keyword.as_str().to_string()),
            Token::String(value) => LiteralKey::Named(value),
            Token::Number(n) => LiteralKey::Named(format_number(n)),
            Token::BigInt(n) => LiteralKey::Named(n.to_string()),
            Token::Punctuator(Punctuator::LBracket) => {
                self.advance()?;
                self.parse_assign_expr(true)?;
                self.tokens.expect_punct(Punctuator::RBracket)?;
                self.emit(Opcode::ToPropKey);
                LiteralKey::Computed
            }
            _ => return Err(self.unexpected("property name")),
        };

        let name = match key {
            LiteralKey::Computed => {
                self.tokens.expect_punct(Punctuator::Colon)?;
                // obj key value -- obj
                self.parse_assign_expr(true)?;
                self.emit(Opcode::DefineArrayEl);
                self.emit(Opcode::Drop);
                return Ok(());
            }
            LiteralKey::Named(name) => name,
        };
        self.advance()?;

        if self.tokens.is_punct(Punctuator::Colon) {
            self.advance()?;
            self.parse_assign_expr(true)?;
        } else if self.tokens.is_punct(Punctuator::LParen) {
            self.parse_method(name.clone())?;
        } else if shorthand_candidate
            && !self.is_reserved(&name)
            && (self.tokens.is_punct(Punctuator::Comma) || self.tokens.is_punct(Punctuator::RBrace))
        {
            let scope = self.unit.scope();
            self.emit(Opcode::ScopeGetVar {
                name: name.clone(),
                scope,
            });
        } else {
            return Err(self.unexpected("':'"));
        }
        self.emit(Opcode::DefineField(name));
        Ok(())
    }
}
