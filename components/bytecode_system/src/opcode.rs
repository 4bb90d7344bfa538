//! Bytecode opcodes for the stack machine
//!
//! Stack comments use `a b -- c` notation with the top of the stack on the
//! right.

use std::fmt;

use serde::Serialize;

/// Identifier of a jump target inside one function's instruction buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LabelId(pub u32);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Identifier of a lexical scope within one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Bytecode opcodes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    // Literals
    /// `-- undefined`
    PushUndefined,
    /// `-- null`
    PushNull,
    /// `-- true`
    PushTrue,
    /// `-- false`
    PushFalse,
    /// `-- n` for small integers
    PushI32(i32),
    /// `-- constant` from the constant pool
    PushConst(usize),
    /// `-- this`
    PushThis,
    /// `-- closure` for the child function at the given index
    FClosure(usize),

    // Stack shuffles
    /// `a --`
    Drop,
    /// `a b -- b`
    Nip,
    /// `a -- a a`
    Dup,
    /// `a b -- a a b`
    Dup1,
    /// `a b -- b a`
    Swap,
    /// `a b c d -- c d a b`
    Swap2,
    /// `x a b -- a b x`
    Rot3l,
    /// `a b x -- x a b`
    Rot3r,
    /// `x a b c -- a b c x`
    Rot4l,
    /// `x a b c d -- a b c d x`
    Rot5l,
    /// `obj a b -- a obj b`
    Perm3,
    /// `a b -- b a b`
    Insert2,
    /// `a b c -- c a b c`
    Insert3,
    /// `a b c d -- d a b c d`
    Insert4,

    // Control flow
    /// Unconditional jump
    Goto(LabelId),
    /// `cond --` and jump when truthy
    IfTrue(LabelId),
    /// `cond --` and jump when falsy
    IfFalse(LabelId),
    /// Binds a label at this point; removed when the chunk is finalized
    Label(LabelId),
    /// `-- catch_offset`; an exception unwinds to this slot, replaces it
    /// with the thrown value and jumps to the label
    Catch(LabelId),
    /// `value --` and leave the function
    Return,
    /// `value --` and raise it
    Throw,
    /// `value -- received is_return`; suspends a generator
    Yield,

    // Objects and arrays
    /// `-- {}`
    Object,
    /// `e0 .. en-1 -- array`
    ArrayFrom(u16),
    /// `obj value -- obj`; defines an own property
    DefineField(String),
    /// `array idx value -- array idx`; defines an own indexed property
    DefineArrayEl,
    /// `obj -- value`
    GetField(String),
    /// `obj -- obj value`
    GetField2(String),
    /// `obj key -- value`
    GetArrayEl,
    /// `obj key -- obj value`
    GetArrayEl2,
    /// `obj value --`
    PutField(String),
    /// `obj key value --`
    PutArrayEl,
    /// `value -- obj`; TypeError for null and undefined
    ToObject,
    /// `key -- property_key`
    ToPropKey,
    /// `obj key -- obj property_key`; TypeError when obj is null or undefined
    ToPropKey2,
    /// Copies own enumerable properties of the source into the target,
    /// skipping keys present in the exclude object. Operands are stack
    /// offsets from the top (0 is the top slot). The stack is unchanged.
    CopyDataProperties {
        /// Offset of the target object
        target: u8,
        /// Offset of the source object
        source: u8,
        /// Offset of the exclude object
        exclude: u8,
    },
    /// `obj func -- obj func`; records `obj` as the method's home object
    SetHomeObject,
    /// `-- base`; prototype of the current method's home object
    PushSuperBase,
    /// `this base key -- value`
    GetSuperValue,
    /// `this base key value --`
    PutSuperValue,

    // Variables
    /// `-- value`; reads a binding resolved from the given scope outwards
    ScopeGetVar {
        /// Binding name
        name: String,
        /// Innermost scope at the access point
        scope: ScopeId,
    },
    /// `value --`; assigns an initialized binding
    ScopePutVar {
        /// Binding name
        name: String,
        /// Innermost scope at the access point
        scope: ScopeId,
    },
    /// `value --`; initializes a lexical binding, ending its dead zone
    ScopePutVarInit {
        /// Binding name
        name: String,
        /// Innermost scope at the access point
        scope: ScopeId,
    },
    /// `-- env name`; captures the environment that currently holds `name`
    MakeScopeRef {
        /// Binding name
        name: String,
        /// Innermost scope at the access point
        scope: ScopeId,
    },
    /// `env name value --`; stores through a captured reference
    PutRefValue,
    /// Creates the lexical bindings of a block scope in their dead zone
    EnterScope(ScopeId),
    /// Discards the bindings of a block scope
    LeaveScope(ScopeId),
    /// `-- argument` at the given index
    GetArg(u16),
    /// `value --`; overwrites the argument at the given index
    PutArg(u16),
    /// `-- array` of the arguments from the given index on
    Rest(u16),

    // Iteration
    /// `obj -- iter next catch_offset`
    ForOfStart,
    /// `iter next catch_offset r0 .. rn-1 -- iter next catch_offset r0 .. rn-1 value done`;
    /// the operand is the number of slots between the iterator record and
    /// the top of the stack
    ForOfNext(u8),
    /// `iter next catch_offset --`; closes the iterator unless it is done
    IteratorClose,
    /// `iter next catch_offset ... value -- value`; drops everything down to
    /// the innermost iterator record and closes that iterator
    IteratorCloseReturn,

    // Operators
    /// `a b -- a === b`
    StrictEq,
    /// `a b -- a !== b`
    StrictNeq,
    /// `a b -- a == b`
    Eq,
    /// `a b -- a != b`
    Neq,
    /// `a b -- a < b`
    Lt,
    /// `a b -- a <= b`
    Lte,
    /// `a b -- a > b`
    Gt,
    /// `a b -- a >= b`
    Gte,
    /// `key obj -- key in obj`
    In,
    /// `a b -- a instanceof b`
    Instanceof,
    /// `a b -- a + b`
    Add,
    /// `a b -- a - b`
    Sub,
    /// `a b -- a * b`
    Mul,
    /// `a b -- a / b`
    Div,
    /// `a b -- a % b`
    Mod,
    /// `a -- -a`
    Neg,
    /// `a -- +a`
    Plus,
    /// `a -- !a`
    Not,
    /// `a -- typeof a`
    Typeof,
    /// `a -- a + 1`
    Inc,
    /// `a -- a == null`
    IsUndefinedOrNull,
    /// `func a0 .. an-1 -- result`
    Call(u16),
    /// `obj func a0 .. an-1 -- result`
    CallMethod(u16),
}

impl Opcode {
    /// Label referenced by a jumping instruction.
    pub fn jump_target(&self) -> Option<LabelId> {
        match self {
            Opcode::Goto(label)
            | Opcode::IfTrue(label)
            | Opcode::IfFalse(label)
            | Opcode::Catch(label) => Some(*label),
            _ => None,
        }
    }

    /// Check if control never falls through to the next instruction
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(self, Opcode::Return | Opcode::Goto(_) | Opcode::Throw)
    }

    /// Check if this opcode is a binary operator
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            Opcode::StrictEq
                | Opcode::StrictNeq
                | Opcode::Eq
                | Opcode::Neq
                | Opcode::Lt
                | Opcode::Lte
                | Opcode::Gt
                | Opcode::Gte
                | Opcode::In
                | Opcode::Instanceof
                | Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
        )
    }

    /// Number of slots popped and pushed.
    ///
    /// Returns `None` for [`Opcode::IteratorCloseReturn`], whose effect
    /// depends on where the innermost iterator record sits.
    pub fn stack_effect(&self) -> Option<(usize, usize)> {
        use Opcode::*;
        let effect = match self {
            PushUndefined | PushNull | PushTrue | PushFalse | PushI32(_) | PushConst(_)
            | PushThis | FClosure(_) | Object | PushSuperBase | ScopeGetVar { .. }
            | GetArg(_) | Rest(_) | Catch(_) => (0, 1),
            Drop => (1, 0),
            Nip => (2, 1),
            Dup => (1, 2),
            Dup1 => (2, 3),
            Swap => (2, 2),
            Swap2 => (4, 4),
            Rot3l | Rot3r | Perm3 => (3, 3),
            Rot4l => (4, 4),
            Rot5l => (5, 5),
            Insert2 => (2, 3),
            Insert3 => (3, 4),
            Insert4 => (4, 5),
            Goto(_) | Label(_) | EnterScope(_) | LeaveScope(_) => (0, 0),
            IfTrue(_) | IfFalse(_) | Return | Throw => (1, 0),
            Yield => (1, 2),
            ArrayFrom(n) => (*n as usize, 1),
            DefineField(_) => (2, 1),
            DefineArrayEl => (3, 2),
            GetField(_) | ToObject | ToPropKey => (1, 1),
            GetField2(_) => (1, 2),
            GetArrayEl => (2, 1),
            GetArrayEl2 | ToPropKey2 | SetHomeObject => (2, 2),
            PutField(_) => (2, 0),
            PutArrayEl | PutRefValue => (3, 0),
            CopyDataProperties { .. } => (0, 0),
            GetSuperValue => (3, 1),
            PutSuperValue => (4, 0),
            ScopePutVar { .. } | ScopePutVarInit { .. } | PutArg(_) => (1, 0),
            MakeScopeRef { .. } => (0, 2),
            ForOfStart => (1, 3),
            ForOfNext(_) => (0, 2),
            IteratorClose => (3, 0),
            IteratorCloseReturn => return None,
            StrictEq | StrictNeq | Eq | Neq | Lt | Lte | Gt | Gte | In | Instanceof | Add | Sub
            | Mul | Div | Mod => (2, 1),
            Neg | Plus | Not | Typeof | Inc | IsUndefinedOrNull => (1, 1),
            Call(argc) => (*argc as usize + 1, 1),
            CallMethod(argc) => (*argc as usize + 2, 1),
        };
        Some(effect)
    }

    /// Lower-case mnemonic used by the disassembler
    pub fn mnemonic(&self) -> &'static str {
        use Opcode::*;
        match self {
            PushUndefined => "undefined",
            PushNull => "null",
            PushTrue => "push_true",
            PushFalse => "push_false",
            PushI32(_) => "push_i32",
            PushConst(_) => "push_const",
            PushThis => "push_this",
            FClosure(_) => "fclosure",
            Drop => "drop",
            Nip => "nip",
            Dup => "dup",
            Dup1 => "dup1",
            Swap => "swap",
            Swap2 => "swap2",
            Rot3l => "rot3l",
            Rot3r => "rot3r",
            Rot4l => "rot4l",
            Rot5l => "rot5l",
            Perm3 => "perm3",
            Insert2 => "insert2",
            Insert3 => "insert3",
            Insert4 => "insert4",
            Goto(_) => "goto",
            IfTrue(_) => "if_true",
            IfFalse(_) => "if_false",
            Label(_) => "label",
            Catch(_) => "catch",
            Return => "return",
            Throw => "throw",
            Yield => "yield",
            Object => "object",
            ArrayFrom(_) => "array_from",
            DefineField(_) => "define_field",
            DefineArrayEl => "define_array_el",
            GetField(_) => "get_field",
            GetField2(_) => "get_field2",
            GetArrayEl => "get_array_el",
            GetArrayEl2 => "get_array_el2",
            PutField(_) => "put_field",
            PutArrayEl => "put_array_el",
            ToObject => "to_object",
            ToPropKey => "to_propkey",
            ToPropKey2 => "to_propkey2",
            CopyDataProperties { .. } => "copy_data_properties",
            SetHomeObject => "set_home_object",
            PushSuperBase => "push_super_base",
            GetSuperValue => "get_super_value",
            PutSuperValue => "put_super_value",
            ScopeGetVar { .. } => "scope_get_var",
            ScopePutVar { .. } => "scope_put_var",
            ScopePutVarInit { .. } => "scope_put_var_init",
            MakeScopeRef { .. } => "scope_make_ref",
            PutRefValue => "put_ref_value",
            EnterScope(_) => "enter_scope",
            LeaveScope(_) => "leave_scope",
            GetArg(_) => "get_arg",
            PutArg(_) => "put_arg",
            Rest(_) => "rest",
            ForOfStart => "for_of_start",
            ForOfNext(_) => "for_of_next",
            IteratorClose => "iterator_close",
            IteratorCloseReturn => "iterator_close_return",
            StrictEq => "strict_eq",
            StrictNeq => "strict_neq",
            Eq => "eq",
            Neq => "neq",
            Lt => "lt",
            Lte => "lte",
            Gt => "gt",
            Gte => "gte",
            In => "in",
            Instanceof => "instanceof",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Mod => "mod",
            Neg => "neg",
            Plus => "plus",
            Not => "not",
            Typeof => "typeof",
            Inc => "inc",
            IsUndefinedOrNull => "is_undefined_or_null",
            Call(_) => "call",
            CallMethod(_) => "call_method",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Opcode::*;
        let name = self.mnemonic();
        match self {
            PushI32(n) => write!(f, "{} {}", name, n),
            PushConst(idx) | FClosure(idx) => write!(f, "{} #{}", name, idx),
            Goto(l) | IfTrue(l) | IfFalse(l) | Label(l) | Catch(l) => write!(f, "{} {}", name, l),
            ArrayFrom(n) => write!(f, "{} {}", name, n),
            DefineField(field) | GetField(field) | GetField2(field) | PutField(field) => {
                write!(f, "{} {}", name, field)
            }
            CopyDataProperties {
                target,
                source,
                exclude,
            } => write!(f, "{} target:{} source:{} exclude:{}", name, target, source, exclude),
            ScopeGetVar { name: var, scope }
            | ScopePutVar { name: var, scope }
            | ScopePutVarInit { name: var, scope }
            | MakeScopeRef { name: var, scope } => write!(f, "{} {} {}", name, var, scope),
            EnterScope(scope) | LeaveScope(scope) => write!(f, "{} {}", name, scope),
            GetArg(idx) | PutArg(idx) | Rest(idx) => write!(f, "{} {}", name, idx),
            ForOfNext(offset) => write!(f, "{} {}", name, offset),
            Call(argc) | CallMethod(argc) => write!(f, "{} {}", name, argc),
            _ => f.write_str(name),
        }
    }
}
