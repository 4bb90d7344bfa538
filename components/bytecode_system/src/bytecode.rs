//! Frozen bytecode produced by [`crate::BytecodeChunk::finalize`]

use std::fmt;

use serde::Serialize;

use crate::instruction::Instruction;
use crate::opcode::{LabelId, Opcode, ScopeId};
use crate::value::Value;

/// How a name was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// `var` declaration, function scoped
    Var,
    /// `let` declaration, block scoped with a dead zone
    Let,
    /// `const` declaration, block scoped with a dead zone
    Const,
    /// Catch clause parameter
    Catch,
    /// Function declaration
    Function,
}

impl BindingKind {
    /// `let` and `const` bindings start uninitialized.
    pub fn is_lexical(self) -> bool {
        matches!(self, BindingKind::Let | BindingKind::Const)
    }

    /// Keyword used in diagnostics and listings
    pub fn keyword(self) -> &'static str {
        match self {
            BindingKind::Var => "var",
            BindingKind::Let => "let",
            BindingKind::Const => "const",
            BindingKind::Catch => "catch",
            BindingKind::Function => "function",
        }
    }
}

/// One declared name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingDescriptor {
    /// Declared name
    pub name: String,
    /// Declaration kind
    pub kind: BindingKind,
}

/// Bindings owned by one scope, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScopeDescriptor {
    /// Enclosing scope, `None` for the function's top scope
    pub parent: Option<ScopeId>,
    /// Names declared directly in this scope
    pub bindings: Vec<BindingDescriptor>,
}

impl ScopeDescriptor {
    /// Looks up a binding declared directly in this scope.
    pub fn binding(&self, name: &str) -> Option<&BindingDescriptor> {
        self.bindings.iter().find(|b| b.name == name)
    }
}

/// Function-level mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FunctionFlags {
    /// Strict mode code
    pub strict: bool,
    /// `function*` body
    pub generator: bool,
    /// Parameter list has only plain identifiers
    pub simple_parameters: bool,
}

/// Compiled code of one script or function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bytecode {
    /// Function name, `None` for scripts and anonymous functions
    pub name: Option<String>,
    /// Instructions with label markers removed
    pub instructions: Vec<Instruction>,
    /// Instruction index of every label, indexed by [`LabelId`]
    pub labels: Vec<Option<usize>>,
    /// Constant pool
    pub constants: Vec<Value>,
    /// Scope tree; scope 0 is the function's top scope
    pub scopes: Vec<ScopeDescriptor>,
    /// Parameter names; destructured parameters appear as empty strings
    pub params: Vec<String>,
    /// Child functions referenced by `fclosure`
    pub functions: Vec<Bytecode>,
    /// Mode flags
    pub flags: FunctionFlags,
}

impl Bytecode {
    /// Instruction index a label resolved to.
    pub fn label_target(&self, label: LabelId) -> Option<usize> {
        self.labels.get(label.0 as usize).copied().flatten()
    }

    /// Iterates over the opcodes in order.
    pub fn opcodes(&self) -> impl Iterator<Item = &Opcode> {
        self.instructions.iter().map(|inst| &inst.opcode)
    }

    /// Number of instructions matching a predicate.
    pub fn count(&self, mut pred: impl FnMut(&Opcode) -> bool) -> usize {
        self.opcodes().filter(|op| pred(op)).count()
    }

    /// Scope descriptor by id.
    pub fn scope(&self, id: ScopeId) -> Option<&ScopeDescriptor> {
        self.scopes.get(id.0 as usize)
    }

    fn write_listing(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let mut header = format!(
            "{}function {}({})",
            indent,
            self.name.as_deref().unwrap_or("<anonymous>"),
            self.params.join(", ")
        );
        if self.flags.strict {
            header.push_str(" strict");
        }
        if self.flags.generator {
            header.push_str(" generator");
        }
        writeln!(f, "{}", header)?;

        for (idx, scope) in self.scopes.iter().enumerate() {
            let names: Vec<String> = scope
                .bindings
                .iter()
                .map(|b| format!("{} {}", b.kind.keyword(), b.name))
                .collect();
            match scope.parent {
                Some(parent) => writeln!(f, "{}  s{} <- {}: [{}]", indent, idx, parent, names.join(", "))?,
                None => writeln!(f, "{}  s{}: [{}]", indent, idx, names.join(", "))?,
            }
        }
        for (idx, constant) in self.constants.iter().enumerate() {
            writeln!(f, "{}  #{} = {}", indent, idx, constant)?;
        }

        for (pc, inst) in self.instructions.iter().enumerate() {
            for (label, target) in self.labels.iter().enumerate() {
                if *target == Some(pc) {
                    writeln!(f, "{}{}:", indent, LabelId(label as u32))?;
                }
            }
            writeln!(f, "{}  {:04}  {}", indent, pc, inst.opcode)?;
        }

        let nested_indent = format!("{}    ", indent);
        for child in &self.functions {
            child.write_listing(f, &nested_indent)?;
        }
        Ok(())
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_listing(f, "")
    }
}
