//! Destructuring pattern compiler
//!
//! Compiles one `{...}` or `[...]` pattern at the current token straight to
//! bytecode. The same code serves declarations (`let {a} = o`), parameters
//! and assignment targets (`[o.x, y] = arr`).
//!
//! A pattern may be followed by `= initializer`, which is only known once
//! the pattern has been parsed. The prologue therefore starts with a
//! tentative region testing the incoming value for `undefined`; it is kept
//! when an initializer follows and erased otherwise.

use bytecode_system::{BindingKind, Opcode};
use core_types::JsError;
use tracing::trace;

use crate::compiler::Compiler;
use crate::error::{internal_error, unexpected_token};
use crate::lexer::{Punctuator, Token};
use crate::lvalue::{Lvalue, PutMode, TargetContext};
use crate::params::check_duplicate_parameter;
use crate::scanner::ScanHints;
use crate::spread::emit_spread;

/// Parameters of one [`Compiler::compile_pattern`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRequest {
    /// Declaration kind; `None` compiles an assignment pattern
    pub kind: Option<BindingKind>,
    /// Leaves are parameters and go through the duplicate check
    pub is_parameter: bool,
    /// The value to destructure is already on the stack
    pub has_value: bool,
    /// Whether the object pattern has a rest property; `None` scans ahead
    pub has_rest: Option<bool>,
    /// A trailing `= expr` is part of this pattern
    pub allow_initializer: bool,
}

impl PatternRequest {
    /// Declaration pattern whose value (or `undefined`) is on the stack.
    pub fn declaration(kind: BindingKind) -> Self {
        Self {
            kind: Some(kind),
            is_parameter: false,
            has_value: true,
            has_rest: None,
            allow_initializer: true,
        }
    }

    /// Assignment pattern whose value comes from the following initializer.
    pub fn assignment() -> Self {
        Self {
            kind: None,
            is_parameter: false,
            has_value: false,
            has_rest: None,
            allow_initializer: true,
        }
    }

    /// Marks the leaves as parameters.
    pub fn parameter(mut self) -> Self {
        self.is_parameter = true;
        self
    }

    /// Uses rest information from an earlier scan.
    pub fn with_rest_hint(mut self, hints: ScanHints) -> Self {
        self.has_rest = Some(hints.contains(ScanHints::REST));
        self
    }

    /// Sets whether a trailing initializer belongs to this pattern.
    pub fn with_initializer(mut self, allow: bool) -> Self {
        self.allow_initializer = allow;
        self
    }
}

/// Whether the pattern consumed a trailing initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initializer {
    /// No `= expr` followed the pattern
    Absent,
    /// `= expr` followed and was compiled
    Present,
}

/// Kind and parameter flag shared by every leaf of one pattern
#[derive(Debug, Clone, Copy)]
struct Leaves {
    kind: Option<BindingKind>,
    is_parameter: bool,
}

impl Leaves {
    fn is_lexical(self) -> bool {
        self.kind.is_some_and(BindingKind::is_lexical)
    }
}

/// A key destructured before an object rest property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludedKey {
    /// Key known at compile time
    Named(String),
    /// Key computed at run time
    Computed,
}

/// Keys an object rest property must skip.
///
/// When the pattern has no rest property nothing is recorded or emitted.
/// Otherwise every key is added to the runtime exclude object, kept just
/// beneath the source object, before its value is read.
#[derive(Debug, Default)]
pub struct ExcludeList {
    active: bool,
    keys: Vec<ExcludedKey>,
}

impl ExcludeList {
    /// Create a list; inactive lists ignore every key
    pub fn new(active: bool) -> Self {
        Self {
            active,
            keys: Vec::new(),
        }
    }

    /// Whether the pattern has a rest property
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Keys recorded so far
    pub fn keys(&self) -> &[ExcludedKey] {
        &self.keys
    }

    /// `exclude source -- exclude source`
    fn record_named(&mut self, compiler: &mut Compiler, name: &str) {
        if !self.active {
            return;
        }
        compiler.emit(Opcode::Swap);
        compiler.emit(Opcode::PushNull);
        compiler.emit(Opcode::DefineField(name.to_string()));
        compiler.emit(Opcode::Swap);
        self.keys.push(ExcludedKey::Named(name.to_string()));
    }

    /// `exclude source key -- exclude source key`; the key must already be
    /// a property key
    fn record_computed(&mut self, compiler: &mut Compiler) {
        if !self.active {
            return;
        }
        compiler.emit(Opcode::Perm3);
        compiler.emit(Opcode::PushNull);
        compiler.emit(Opcode::DefineArrayEl);
        compiler.emit(Opcode::Perm3);
        self.keys.push(ExcludedKey::Computed);
    }
}

enum PropertyKey {
    Named(String),
    Computed,
}

/// Stack rotation moving `depth` receiver slots beneath the source (and
/// computed key) so the read leaves the value right above them
fn receiver_rotation(depth: u8, computed: bool) -> Vec<Opcode> {
    match (depth, computed) {
        // source x -- x source
        (1, false) => vec![Opcode::Swap],
        (2, false) => vec![Opcode::Rot3l],
        (3, false) => vec![Opcode::Rot4l],
        // source key x -- x source key
        (1, true) => vec![Opcode::Rot3r],
        (2, true) => vec![Opcode::Swap2],
        (3, true) => vec![Opcode::Rot5l, Opcode::Rot5l],
        _ => Vec::new(),
    }
}

impl Compiler {
    /// Compiles the pattern starting at the current `{` or `[`.
    ///
    /// With `has_value` the value to destructure is on the stack and is
    /// consumed. Without it the value comes from a mandatory initializer and
    /// is left on the stack as the expression result.
    pub fn compile_pattern(&mut self, request: PatternRequest) -> Result<Initializer, JsError> {
        let has_rest = match request.has_rest {
            Some(has_rest) => has_rest,
            None => self
                .skip_parens_token(false)
                .hints
                .contains(ScanHints::REST),
        };

        let parse_label = self.unit.chunk.new_label();
        let assign_label = self.unit.chunk.new_label();
        let start = self.unit.chunk.open_region();
        if request.has_value {
            self.emit(Opcode::Dup);
            self.emit(Opcode::PushUndefined);
            self.emit(Opcode::StrictEq);
            self.emit(Opcode::IfTrue(parse_label));
            self.unit.chunk.emit_label(assign_label);
        } else {
            self.emit(Opcode::Goto(parse_label));
            self.unit.chunk.emit_label(assign_label);
            self.emit(Opcode::Dup);
        }
        let region = self.unit.chunk.close_region(start, parse_label);

        let leaves = Leaves {
            kind: request.kind,
            is_parameter: request.is_parameter,
        };
        match self.tokens.token() {
            Token::Punctuator(Punctuator::LBrace) => {
                self.compile_object_pattern(leaves, has_rest)?;
            }
            Token::Punctuator(Punctuator::LBracket) => self.compile_array_pattern(leaves)?,
            _ => return Err(self.error("invalid assignment syntax")),
        }

        if request.allow_initializer && self.tokens.is_punct(Punctuator::Assign) {
            self.unit.chunk.commit_region(region);
            let done = self.unit.chunk.emit_goto(Opcode::Goto);
            self.advance()?;
            self.unit.chunk.emit_label(parse_label);
            if request.has_value {
                self.emit(Opcode::Drop);
            }
            self.parse_assign_expr(true)?;
            self.emit(Opcode::Goto(assign_label));
            self.unit.chunk.emit_label(done);
            Ok(Initializer::Present)
        } else {
            if !request.has_value {
                return Err(self.error("too complicated destructuring expression"));
            }
            self.unit.chunk.discard_region(region);
            Ok(Initializer::Absent)
        }
    }

    /// Returns the keys the rest property, if any, had to skip.
    fn compile_object_pattern(
        &mut self,
        leaves: Leaves,
        has_rest: bool,
    ) -> Result<ExcludeList, JsError> {
        self.advance()?;
        // throws when the value cannot be converted to an object
        self.emit(Opcode::ToObject);
        if has_rest {
            // exclude object just below the source
            self.emit(Opcode::Object);
            self.emit(Opcode::Swap);
        }
        let mut exclude = ExcludeList::new(has_rest);

        while !self.tokens.is_punct(Punctuator::RBrace) {
            if self.tokens.is_punct(Punctuator::Ellipsis) {
                self.compile_object_rest(leaves, &exclude)?;
                break;
            }

            let key = self.parse_pattern_property_name()?;
            if self.tokens.is_punct(Punctuator::Colon) {
                self.advance()?;
                self.compile_keyed_property(leaves, key, &mut exclude)?;
            } else {
                let PropertyKey::Named(name) = key else {
                    return Err(self.error("expecting ':'"));
                };
                self.compile_shorthand_property(leaves, name, &mut exclude)?;
            }

            if self.tokens.is_punct(Punctuator::RBrace) {
                break;
            }
            self.tokens.expect_punct(Punctuator::Comma)?;
        }

        self.emit(Opcode::Drop);
        if has_rest {
            self.emit(Opcode::Drop);
        }
        self.advance()?;
        Ok(exclude)
    }

    fn compile_object_rest(&mut self, leaves: Leaves, exclude: &ExcludeList) -> Result<(), JsError> {
        if !exclude.is_active() {
            return Err(internal_error(
                "unexpected ellipsis token",
                Some(self.tokens.position()),
            ));
        }
        self.advance()?;
        let (name, lvalue) = match leaves.kind {
            Some(_) => {
                let name = self.parse_destructuring_var(leaves.is_parameter)?;
                let lvalue = Lvalue::binding(name.clone(), self.unit.scope());
                (Some(name), lvalue)
            }
            None => {
                self.parse_left_hand_side_expr()?;
                (None, self.get_lvalue(TargetContext::Pattern)?)
            }
        };
        if !self.tokens.is_punct(Punctuator::RBrace) {
            return Err(self.error("assignment rest property must be last"));
        }
        trace!(excluded = exclude.keys().len(), "object rest");
        let depth = lvalue.depth();
        self.emit(Opcode::Object);
        self.emit(Opcode::CopyDataProperties {
            target: 0,
            source: depth + 1,
            exclude: depth + 2,
        });
        self.store_leaf(leaves, name.as_deref(), lvalue, true)
    }

    /// Property name in a pattern. Computed keys are evaluated onto the
    /// stack. Stops on the token after the name.
    fn parse_pattern_property_name(&mut self) -> Result<PropertyKey, JsError> {
        let name = match self.tokens.token().clone() {
            Token::Identifier(name) => name,
            Token::Keyword(keyword) => keyword.as_str().to_string(),
            Token::String(value) => value,
            Token::Number(n) => bytecode_system::format_number(n),
            Token::BigInt(n) => n.to_string(),
            Token::Punctuator(Punctuator::LBracket) => {
                self.advance()?;
                self.parse_assign_expr(true)?;
                self.tokens.expect_punct(Punctuator::RBracket)?;
                return Ok(PropertyKey::Computed);
            }
            other => {
                return Err(unexpected_token(
                    "property name",
                    &other.describe(),
                    Some(self.tokens.position()),
                ))
            }
        };
        let shorthand_candidate = matches!(self.tokens.token(), Token::Identifier(_));
        self.advance()?;
        if !self.tokens.is_punct(Punctuator::Colon) {
            if !shorthand_candidate || self.is_reserved(&name) {
                return Err(self.error("expecting ':'"));
            }
        }
        Ok(PropertyKey::Named(name))
    }

    fn compile_keyed_property(
        &mut self,
        leaves: Leaves,
        key: PropertyKey,
        exclude: &mut ExcludeList,
    ) -> Result<(), JsError> {
        if self.tokens.is_punct(Punctuator::LBracket) || self.tokens.is_punct(Punctuator::LBrace) {
            let scan = self.skip_parens_token(false);
            if scan.follow.is_any_punct(&[
                Punctuator::Comma,
                Punctuator::Assign,
                Punctuator::RBrace,
            ]) {
                match &key {
                    PropertyKey::Computed => {
                        if exclude.is_active() {
                            // convert once so the key is not stringified twice
                            self.emit(Opcode::ToPropKey);
                            exclude.record_computed(self);
                        }
                        self.emit(Opcode::GetArrayEl2);
                    }
                    PropertyKey::Named(name) => {
                        exclude.record_named(self, name);
                        self.emit(Opcode::GetField2(name.clone()));
                    }
                }
                let nested = PatternRequest {
                    kind: leaves.kind,
                    is_parameter: leaves.is_parameter,
                    has_value: true,
                    has_rest: None,
                    allow_initializer: true,
                };
                self.compile_pattern(nested)?;
                return Ok(());
            }
        }

        match &key {
            PropertyKey::Computed => {
                self.emit(Opcode::ToPropKey2);
                exclude.record_computed(self);
                // source key -- source source key
                self.emit(Opcode::Dup1);
            }
            PropertyKey::Named(name) => {
                exclude.record_named(self, name);
                self.emit(Opcode::Dup);
            }
        }

        let computed = matches!(key, PropertyKey::Computed);
        let (name, lvalue) = match leaves.kind {
            Some(_) => {
                let name = self.parse_destructuring_var(leaves.is_parameter)?;
                let lvalue = Lvalue::binding(name.clone(), self.unit.scope());
                (Some(name), lvalue)
            }
            None => {
                self.parse_left_hand_side_expr()?;
                let lvalue = self.get_lvalue(TargetContext::Pattern)?;
                for op in receiver_rotation(lvalue.depth(), computed) {
                    self.emit(op);
                }
                (None, lvalue)
            }
        };
        match key {
            PropertyKey::Computed => self.emit(Opcode::GetArrayEl),
            PropertyKey::Named(field) => self.emit(Opcode::GetField(field)),
        }
        self.store_leaf(leaves, name.as_deref(), lvalue, true)
    }

    fn compile_shorthand_property(
        &mut self,
        leaves: Leaves,
        name: String,
        exclude: &mut ExcludeList,
    ) -> Result<(), JsError> {
        if leaves.is_parameter {
            check_duplicate_parameter(&self.unit, &name)
                .map_err(|err| err.with_position(self.tokens.position()))?;
        }
        if self.is_strict() && (name == "eval" || name == "arguments") {
            return Err(self.error("invalid destructuring target"));
        }
        exclude.record_named(self, &name);

        if matches!(leaves.kind, None | Some(BindingKind::Var)) {
            // read through a reference so a dynamic scope cannot rebind
            // the name between resolution and store
            self.emit(Opcode::Dup);
            self.emit(Opcode::ScopeGetVar {
                name: name.clone(),
                scope: self.unit.scope(),
            });
            let lvalue = self.get_lvalue(TargetContext::Pattern)?;
            for op in receiver_rotation(lvalue.depth(), false) {
                self.emit(op);
            }
            self.emit(Opcode::GetField(name.clone()));
            return self.store_leaf(leaves, Some(&name), lvalue, true);
        }

        // source -- source value
        self.emit(Opcode::GetField2(name.clone()));
        let lvalue = Lvalue::binding(name.clone(), self.unit.scope());
        self.store_leaf(leaves, Some(&name), lvalue, true)
    }

    fn compile_array_pattern(&mut self, leaves: Leaves) -> Result<(), JsError> {
        self.advance()?;
        self.emit(Opcode::ForOfStart);
        self.with_iterator_scope(|c| c.compile_array_elements(leaves))?;
        // a completed iterator is not closed again
        self.emit(Opcode::IteratorClose);
        self.advance()
    }

    fn compile_array_elements(&mut self, leaves: Leaves) -> Result<(), JsError> {
        while !self.tokens.is_punct(Punctuator::RBracket) {
            let mut has_spread = false;
            if self.tokens.is_punct(Punctuator::Ellipsis) {
                self.advance()?;
                if self.tokens.is_punct(Punctuator::Comma)
                    || self.tokens.is_punct(Punctuator::RBracket)
                {
                    return Err(self.error("missing binding pattern..."));
                }
                has_spread = true;
            }

            if self.tokens.is_punct(Punctuator::Comma) {
                // elision
                self.emit(Opcode::ForOfNext(0));
                self.emit(Opcode::Drop);
                self.emit(Opcode::Drop);
            } else if let Some(hints) = self.nested_pattern_ahead(Punctuator::RBracket, has_spread)? {
                let nested = PatternRequest {
                    kind: leaves.kind,
                    is_parameter: leaves.is_parameter,
                    has_value: true,
                    has_rest: None,
                    allow_initializer: true,
                }
                .with_rest_hint(hints);
                self.compile_pattern(nested)?;
            } else {
                self.compile_array_leaf(leaves, has_spread)?;
            }

            if self.tokens.is_punct(Punctuator::RBracket) {
                break;
            }
            if has_spread {
                return Err(self.error("rest element must be the last one"));
            }
            self.tokens.expect_punct(Punctuator::Comma)?;
        }
        Ok(())
    }

    /// Emits the pull for a nested pattern element and returns the scan
    /// hints, or `None` when the element is not a nested pattern.
    fn nested_pattern_ahead(
        &mut self,
        close: Punctuator,
        has_spread: bool,
    ) -> Result<Option<ScanHints>, JsError> {
        if !self.tokens.is_punct(Punctuator::LBracket) && !self.tokens.is_punct(Punctuator::LBrace) {
            return Ok(None);
        }
        let scan = self.skip_parens_token(false);
        if !scan
            .follow
            .is_any_punct(&[Punctuator::Comma, Punctuator::Assign, close])
        {
            return Ok(None);
        }
        if has_spread {
            if scan.follow.is_punct(Punctuator::Assign) {
                return Err(self.error("rest element cannot have a default value"));
            }
            emit_spread(&mut self.unit, 0);
        } else {
            self.emit(Opcode::ForOfNext(0));
            self.emit(Opcode::Drop);
        }
        Ok(Some(scan.hints))
    }

    fn compile_array_leaf(&mut self, leaves: Leaves, has_spread: bool) -> Result<(), JsError> {
        let lvalue = match leaves.kind {
            Some(kind) => {
                let name = self.parse_destructuring_var(leaves.is_parameter)?;
                self.define_var(&name, kind)?;
                Lvalue::binding(name, self.unit.scope())
            }
            None => {
                self.parse_left_hand_side_expr()?;
                self.get_lvalue(TargetContext::Pattern)?
            }
        };
        let depth = lvalue.depth();
        if has_spread {
            emit_spread(&mut self.unit, depth);
        } else {
            self.emit(Opcode::ForOfNext(depth));
            self.emit(Opcode::Drop);
            self.compile_default_value(&lvalue)?;
        }
        self.put_lvalue(&lvalue, PutMode::NoKeepDepth, leaves.is_lexical());
        Ok(())
    }

    /// Defines the leaf binding when declaring, applies an optional default
    /// and stores the value.
    fn store_leaf(
        &mut self,
        leaves: Leaves,
        name: Option<&str>,
        lvalue: Lvalue,
        allow_default: bool,
    ) -> Result<(), JsError> {
        if let (Some(kind), Some(name)) = (leaves.kind, name) {
            self.define_var(name, kind)?;
        }
        if allow_default {
            self.compile_default_value(&lvalue)?;
        }
        self.put_lvalue(&lvalue, PutMode::NoKeepDepth, leaves.is_lexical());
        Ok(())
    }

    /// `value -- value'` where a strictly `undefined` value is replaced by
    /// the default expression after `=`, if any. An anonymous function
    /// default is named after a binding target.
    fn compile_default_value(&mut self, target: &Lvalue) -> Result<(), JsError> {
        if !self.tokens.is_punct(Punctuator::Assign) {
            return Ok(());
        }
        self.emit(Opcode::Dup);
        self.emit(Opcode::PushUndefined);
        self.emit(Opcode::StrictEq);
        let has_value = self.unit.chunk.emit_goto(Opcode::IfFalse);
        self.advance()?;
        self.emit(Opcode::Drop);
        self.parse_assign_expr(true)?;
        if let Some(name) = target.name() {
            self.set_object_name(name);
        }
        self.unit.chunk.emit_label(has_value);
        Ok(())
    }

    /// Binding name leaf of a declaration pattern.
    pub(crate) fn parse_destructuring_var(&mut self, is_parameter: bool) -> Result<String, JsError> {
        let name = match self.tokens.ident_name() {
            Some(name) if !self.is_reserved(name) => name.to_string(),
            _ => return Err(self.error("invalid destructuring target")),
        };
        if self.is_strict() && (name == "eval" || name == "arguments") {
            return Err(self.error("invalid destructuring target"));
        }
        if is_parameter {
            check_duplicate_parameter(&self.unit, &name)
                .map_err(|err| err.with_position(self.tokens.position()))?;
        }
        self.advance()?;
        Ok(name)
    }
}
