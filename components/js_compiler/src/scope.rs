//! Scope tree of one compilation unit
//!
//! Scope 0 is the function (or script) scope. Block scopes are pushed and
//! popped as the parser enters and leaves them; the tree itself is kept so
//! it can be exported with the bytecode.

use bytecode_system::{BindingDescriptor, BindingKind, ScopeDescriptor, ScopeId};
use core_types::{JsError, SourcePosition};

use crate::error::syntax_error;

/// Where a name was found by [`ScopeTable::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Scope holding the binding
    pub scope: ScopeId,
    /// Declaration kind
    pub kind: BindingKind,
}

/// Scope tree with a cursor on the innermost open scope
#[derive(Debug, Clone)]
pub struct ScopeTable {
    scopes: Vec<ScopeDescriptor>,
    current: ScopeId,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    /// Create a table holding only the function scope
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeDescriptor::default()],
            current: ScopeId(0),
        }
    }

    /// Innermost open scope
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Opens a block scope nested in the current one.
    pub fn push_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeDescriptor {
            parent: Some(self.current),
            bindings: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Closes the current block scope. The function scope is never closed.
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.descriptor(self.current).parent {
            self.current = parent;
        }
    }

    fn descriptor(&self, id: ScopeId) -> &ScopeDescriptor {
        &self.scopes[id.0 as usize]
    }

    fn descriptor_mut(&mut self, id: ScopeId) -> &mut ScopeDescriptor {
        &mut self.scopes[id.0 as usize]
    }

    fn chain(&self) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(self.current), |id| self.descriptor(*id).parent)
    }

    /// Resolves `name` from the current scope outwards.
    pub fn lookup(&self, name: &str) -> Option<Resolved> {
        self.chain().find_map(|id| {
            self.descriptor(id).binding(name).map(|b| Resolved {
                scope: id,
                kind: b.kind,
            })
        })
    }

    /// Whether any scope of the unit declares `name`.
    pub fn find_var(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.binding(name).is_some())
    }

    /// Registers `name` in the scope its kind belongs to.
    ///
    /// `params` is the unit's parameter list: a `var` that names a
    /// parameter reuses the argument slot and is not registered again.
    pub fn define(
        &mut self,
        name: &str,
        kind: BindingKind,
        params: &[String],
        position: Option<SourcePosition>,
    ) -> Result<(), JsError> {
        let redefinition = || {
            syntax_error(
                format!("invalid redefinition of lexical identifier '{}'", name),
                position,
            )
        };
        let at_function_scope = self.current == ScopeId(0);

        match kind {
            BindingKind::Var => {
                for id in self.chain() {
                    if let Some(b) = self.descriptor(id).binding(name) {
                        let block_function = b.kind == BindingKind::Function && id != ScopeId(0);
                        if b.kind.is_lexical() || block_function {
                            return Err(redefinition());
                        }
                    }
                }
                if params.iter().any(|p| p == name) {
                    return Ok(());
                }
                let function_scope = self.descriptor_mut(ScopeId(0));
                if function_scope.binding(name).is_none() {
                    function_scope.bindings.push(BindingDescriptor {
                        name: name.to_string(),
                        kind,
                    });
                }
                Ok(())
            }
            BindingKind::Function if at_function_scope => {
                let function_scope = self.descriptor_mut(ScopeId(0));
                match function_scope.bindings.iter_mut().find(|b| b.name == name) {
                    Some(b) if b.kind.is_lexical() => Err(redefinition()),
                    Some(b) => {
                        b.kind = BindingKind::Function;
                        Ok(())
                    }
                    None => {
                        function_scope.bindings.push(BindingDescriptor {
                            name: name.to_string(),
                            kind,
                        });
                        Ok(())
                    }
                }
            }
            _ => {
                let current = self.current;
                if self.descriptor(current).binding(name).is_some()
                    || (at_function_scope && params.iter().any(|p| p == name))
                {
                    return Err(redefinition());
                }
                self.descriptor_mut(current).bindings.push(BindingDescriptor {
                    name: name.to_string(),
                    kind,
                });
                Ok(())
            }
        }
    }

    /// Lexical bindings created when `id` is entered.
    pub fn scope(&self, id: ScopeId) -> &ScopeDescriptor {
        self.descriptor(id)
    }

    /// Consumes the table into the descriptors stored with the bytecode.
    pub fn into_descriptors(self) -> Vec<ScopeDescriptor> {
        self.scopes
    }
}
