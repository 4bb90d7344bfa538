//! Per-function compilation state

use bytecode_system::{Bytecode, BytecodeChunk, FunctionFlags, Opcode, ScopeId};
use core_types::JsError;

use crate::scope::ScopeTable;

/// Everything the compiler mutates while compiling one script or function
#[derive(Debug)]
pub struct CompilationUnit {
    /// Function name, `None` for the script
    pub name: Option<String>,
    /// Instruction buffer and label table
    pub chunk: BytecodeChunk,
    /// Scope tree
    pub scopes: ScopeTable,
    /// Parameter names; destructured parameters are recorded as ""
    pub params: Vec<String>,
    /// Mode flags
    pub flags: FunctionFlags,
    /// Compiled child functions, indexed by `fclosure`
    pub functions: Vec<Bytecode>,
    /// Function body rather than script; allows `return`
    pub is_function: bool,
    /// Object literal method; allows `super.x`
    pub allows_super: bool,
    open_iterators: usize,
}

impl CompilationUnit {
    /// Create an empty unit
    pub fn new(name: Option<String>, flags: FunctionFlags) -> Self {
        Self {
            name,
            chunk: BytecodeChunk::new(),
            scopes: ScopeTable::new(),
            params: Vec::new(),
            flags,
            functions: Vec::new(),
            is_function: false,
            allows_super: false,
            open_iterators: 0,
        }
    }

    /// Emit an instruction
    pub fn emit(&mut self, opcode: Opcode) {
        self.chunk.emit(opcode);
    }

    /// Innermost open scope
    pub fn scope(&self) -> ScopeId {
        self.scopes.current()
    }

    /// Marks the start of an array pattern whose iterator must be closed
    /// if a `yield` inside it returns.
    pub fn enter_iterator_scope(&mut self) {
        self.open_iterators += 1;
    }

    /// Ends the innermost iterator region.
    pub fn leave_iterator_scope(&mut self) {
        self.open_iterators = self.open_iterators.saturating_sub(1);
    }

    /// Iterator records currently open on the operand stack
    pub fn open_iterator_count(&self) -> usize {
        self.open_iterators
    }

    /// Resolves labels and freezes the unit.
    pub fn finish(self) -> Result<Bytecode, JsError> {
        let mut code = self.chunk.finalize()?;
        code.name = self.name;
        code.scopes = self.scopes.into_descriptors();
        code.params = self.params;
        code.functions = self.functions;
        code.flags = self.flags;
        Ok(code)
    }
}
