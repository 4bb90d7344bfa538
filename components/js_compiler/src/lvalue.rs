//! Assignment targets
//!
//! The expression parser emits an ordinary read for whatever it parses. When
//! that expression turns out to be an assignment target, [`Compiler::get_lvalue`]
//! takes the read back off the buffer and leaves the receiver slots the
//! matching store needs.

use bytecode_system::{Opcode, ScopeId};
use core_types::JsError;

use crate::compiler::Compiler;

/// How a resolved target is stored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// Direct binding store; nothing beneath the value
    ScopeVar {
        /// Binding name
        name: String,
        /// Scope at the access point
        scope: ScopeId,
    },
    /// Store through `env name` captured by `scope_make_ref`
    Ref(String),
    /// `obj.name`
    Field(String),
    /// `obj[key]`
    ArrayElement,
    /// `super[key]` with `this` and the home object's prototype beneath
    SuperValue,
}

/// A resolved assignment target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lvalue {
    /// Store used once the value is on top of the receivers
    pub store: StoreKind,
}

impl Lvalue {
    /// A binding stored without a reference.
    pub fn binding(name: impl Into<String>, scope: ScopeId) -> Self {
        Self {
            store: StoreKind::ScopeVar {
                name: name.into(),
                scope,
            },
        }
    }

    /// Receiver slots the target keeps beneath the value (0 to 3).
    pub fn depth(&self) -> u8 {
        match self.store {
            StoreKind::ScopeVar { .. } => 0,
            StoreKind::Field(_) => 1,
            StoreKind::Ref(_) | StoreKind::ArrayElement => 2,
            StoreKind::SuperValue => 3,
        }
    }

    /// Name of the binding the target stores to, if it is one.
    pub fn name(&self) -> Option<&str> {
        match &self.store {
            StoreKind::ScopeVar { name, .. } | StoreKind::Ref(name) => Some(name),
            _ => None,
        }
    }
}

/// Where the target was written, for the error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetContext {
    /// Inside a destructuring pattern
    Pattern,
    /// Left of `=`
    Assignment,
}

/// What [`Compiler::put_lvalue`] leaves behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Receivers and value are consumed
    NoKeepDepth,
    /// The stored value stays on the stack as the expression result
    KeepTop,
}

impl Compiler {
    /// Turns the read just emitted for an assignable expression into the
    /// receiver slots of the corresponding store.
    pub fn get_lvalue(&mut self, context: TargetContext) -> Result<Lvalue, JsError> {
        let invalid = |c: &Compiler| match context {
            TargetContext::Pattern => c.error("invalid destructuring target"),
            TargetContext::Assignment => c.error("invalid assignment left-hand side"),
        };

        let store = match self.unit.chunk.last_opcode() {
            Some(Opcode::ScopeGetVar { name, .. }) => {
                if self.is_strict() && (name == "eval" || name == "arguments") {
                    return Err(self.error("invalid lvalue in strict mode"));
                }
                StoreKind::Ref(name.clone())
            }
            Some(Opcode::GetField(name)) => StoreKind::Field(name.clone()),
            Some(Opcode::GetArrayEl) => StoreKind::ArrayElement,
            Some(Opcode::GetSuperValue) => StoreKind::SuperValue,
            _ => return Err(invalid(self)),
        };

        let read = self.unit.chunk.remove_last_opcode();
        match (&store, read) {
            (StoreKind::Ref(_), Some(Opcode::ScopeGetVar { name, scope })) => {
                self.emit(Opcode::MakeScopeRef { name, scope });
            }
            (StoreKind::ArrayElement, _) => self.emit(Opcode::ToPropKey2),
            (StoreKind::SuperValue, _) => self.emit(Opcode::ToPropKey),
            _ => {}
        }
        Ok(Lvalue { store })
    }

    /// Emits the store for `lvalue`. `init` selects the initializing store
    /// for `let`/`const` bindings.
    pub fn put_lvalue(&mut self, lvalue: &Lvalue, mode: PutMode, init: bool) {
        if mode == PutMode::KeepTop {
            let keep = match lvalue.store {
                StoreKind::ScopeVar { .. } => Opcode::Dup,
                StoreKind::Field(_) => Opcode::Insert2,
                StoreKind::Ref(_) | StoreKind::ArrayElement => Opcode::Insert3,
                StoreKind::SuperValue => Opcode::Insert4,
            };
            self.emit(keep);
        }
        let store = match &lvalue.store {
            StoreKind::ScopeVar { name, scope } if init => Opcode::ScopePutVarInit {
                name: name.clone(),
                scope: *scope,
            },
            StoreKind::ScopeVar { name, scope } => Opcode::ScopePutVar {
                name: name.clone(),
                scope: *scope,
            },
            StoreKind::Ref(_) => Opcode::PutRefValue,
            StoreKind::Field(name) => Opcode::PutField(name.clone()),
            StoreKind::ArrayElement => Opcode::PutArrayEl,
            StoreKind::SuperValue => Opcode::PutSuperValue,
        };
        self.emit(store);
    }
}
