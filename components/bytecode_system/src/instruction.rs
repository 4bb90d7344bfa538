//! Bytecode instruction representation

use core_types::SourcePosition;
use serde::Serialize;

use crate::opcode::Opcode;

/// A single bytecode instruction with optional source mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    /// The opcode for this instruction
    pub opcode: Opcode,
    /// Position of the token that produced the instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_position: Option<SourcePosition>,
}

impl Instruction {
    /// Create a new instruction without source position
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            source_position: None,
        }
    }

    /// Create a new instruction with source position
    pub fn with_position(opcode: Opcode, position: SourcePosition) -> Self {
        Self {
            opcode,
            source_position: Some(position),
        }
    }
}
