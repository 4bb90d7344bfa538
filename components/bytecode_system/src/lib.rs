//! Bytecode system for the destructuring compiler
//!
//! This crate defines the stack-machine instruction set the compiler emits
//! and the buffer it emits into.
//!
//! # Features
//!
//! - Stack-based opcode set with static stack effects
//! - Symbolic, reference-counted jump labels resolved at finalization
//! - Tentative regions that can be committed or erased after emission
//! - Stack depth verification and a disassembly listing
//!
//! # Example
//!
//! ```
//! use bytecode_system::{verify_stack, BytecodeChunk, Opcode};
//!
//! let mut chunk = BytecodeChunk::new();
//! let done = chunk.new_label();
//!
//! chunk.emit(Opcode::PushNull);
//! chunk.emit(Opcode::Dup);
//! chunk.emit(Opcode::PushUndefined);
//! chunk.emit(Opcode::StrictEq);
//! chunk.emit(Opcode::IfFalse(done));
//! chunk.emit_label(done);
//! chunk.emit(Opcode::Return);
//!
//! let code = chunk.finalize().unwrap();
//! let report = verify_stack(&code).unwrap();
//! assert_eq!(report.return_depths, vec![1]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytecode;
pub mod chunk;
pub mod instruction;
pub mod opcode;
pub mod value;
pub mod verifier;

// Re-export main types at crate root
pub use bytecode::{BindingDescriptor, BindingKind, Bytecode, FunctionFlags, ScopeDescriptor};
pub use chunk::{BytecodeChunk, RegionStart, TentativeRegion};
pub use instruction::Instruction;
pub use opcode::{LabelId, Opcode, ScopeId};
pub use value::{format_number, Value};
pub use verifier::{verify_stack, StackReport};
