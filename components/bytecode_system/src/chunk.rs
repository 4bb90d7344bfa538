//! Bytecode chunk - the instruction buffer of a function being compiled
//!
//! Jumps reference symbolic labels. Each label counts the jumps that target
//! it, and [`BytecodeChunk::finalize`] checks those counts against the
//! instructions that survived before resolving labels to instruction
//! indices.

use core_types::{ErrorKind, JsError, SourcePosition};
use tracing::trace;

use crate::bytecode::{Bytecode, FunctionFlags};
use crate::instruction::Instruction;
use crate::opcode::{LabelId, Opcode};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LabelSlot {
    ref_count: u32,
    bound: bool,
}

/// Start of a speculative code region, see [`BytecodeChunk::open_region`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionStart(usize);

/// A closed speculative code region guarded by a label.
///
/// Must be handed to exactly one of [`BytecodeChunk::commit_region`] or
/// [`BytecodeChunk::discard_region`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a tentative region must be committed or discarded"]
pub struct TentativeRegion {
    start: usize,
    end: usize,
    guard: LabelId,
}

impl TentativeRegion {
    /// Label whose reference lives inside the region
    pub fn guard(&self) -> LabelId {
        self.guard
    }

    /// Number of instructions in the region
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the region holds no instructions
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Instruction buffer, constant pool and label table of one function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BytecodeChunk {
    instructions: Vec<Instruction>,
    constants: Vec<Value>,
    labels: Vec<LabelSlot>,
    last_opcode_pos: Option<usize>,
    position: Option<SourcePosition>,
}

impl BytecodeChunk {
    /// Create a new empty bytecode chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source position attached to subsequently emitted
    /// instructions.
    pub fn set_position(&mut self, position: SourcePosition) {
        self.position = Some(position);
    }

    /// Emit an instruction at the current source position
    pub fn emit(&mut self, opcode: Opcode) {
        if let Some(label) = opcode.jump_target() {
            self.slot_mut(label).ref_count += 1;
        }
        if let Opcode::Label(label) = opcode {
            self.slot_mut(label).bound = true;
        }
        self.last_opcode_pos = Some(self.instructions.len());
        let inst = match self.position {
            Some(pos) => Instruction::with_position(opcode, pos),
            None => Instruction::new(opcode),
        };
        self.instructions.push(inst);
    }

    /// Emit an instruction with an explicit source position
    pub fn emit_with_position(&mut self, opcode: Opcode, position: SourcePosition) {
        let saved = self.position.replace(position);
        self.emit(opcode);
        self.position = saved;
    }

    /// Allocates a fresh, unbound label.
    pub fn new_label(&mut self) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(LabelSlot::default());
        id
    }

    /// Binds `label` at the current end of the buffer.
    pub fn emit_label(&mut self, label: LabelId) {
        self.emit(Opcode::Label(label));
    }

    /// Emits a jump to a fresh label built by `make` and returns the label.
    pub fn emit_goto(&mut self, make: fn(LabelId) -> Opcode) -> LabelId {
        let label = self.new_label();
        self.emit(make(label));
        label
    }

    /// Number of live jumps targeting `label`.
    pub fn label_ref_count(&self, label: LabelId) -> u32 {
        self.labels
            .get(label.0 as usize)
            .map_or(0, |slot| slot.ref_count)
    }

    /// Whether a marker for `label` is present in the buffer.
    pub fn is_label_bound(&self, label: LabelId) -> bool {
        self.labels
            .get(label.0 as usize)
            .is_some_and(|slot| slot.bound)
    }

    /// Opcode of the most recently emitted instruction, if it is still the
    /// last one in the buffer.
    pub fn last_opcode(&self) -> Option<&Opcode> {
        let pos = self.last_opcode_pos?;
        self.instructions.get(pos).map(|inst| &inst.opcode)
    }

    /// Removes the most recently emitted instruction and returns its opcode.
    pub fn remove_last_opcode(&mut self) -> Option<Opcode> {
        let pos = self.last_opcode_pos.take()?;
        if pos + 1 != self.instructions.len() {
            return None;
        }
        let inst = self.instructions.pop()?;
        self.forget(&inst.opcode);
        Some(inst.opcode)
    }

    /// Add a constant to the pool, reusing an identical entry
    pub fn add_constant(&mut self, value: Value) -> usize {
        if let Some(idx) = self.constants.iter().position(|c| c.same_constant(&value)) {
            return idx;
        }
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Instructions emitted so far
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Get the number of constants
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// Marks the start of code that may later be erased.
    pub fn open_region(&mut self) -> RegionStart {
        RegionStart(self.instructions.len())
    }

    /// Closes a region opened by [`open_region`](Self::open_region).
    /// `guard` is the label referenced from inside the region.
    pub fn close_region(&mut self, start: RegionStart, guard: LabelId) -> TentativeRegion {
        TentativeRegion {
            start: start.0,
            end: self.instructions.len(),
            guard,
        }
    }

    /// Keeps the region's instructions.
    pub fn commit_region(&mut self, region: TentativeRegion) {
        trace!(guard = %region.guard, len = region.len(), "committed tentative region");
    }

    /// Erases the region's instructions. Every jump inside releases its
    /// label reference and every label bound inside becomes unbound.
    pub fn discard_region(&mut self, region: TentativeRegion) {
        let removed: Vec<Instruction> = self.instructions.drain(region.start..region.end).collect();
        for inst in &removed {
            self.forget(&inst.opcode);
        }
        self.last_opcode_pos = None;
        trace!(
            guard = %region.guard,
            len = removed.len(),
            guard_refs = self.label_ref_count(region.guard),
            "discarded tentative region"
        );
    }

    /// Resolves labels and freezes the chunk.
    ///
    /// Fails with an internal error when a label's reference count does not
    /// match the jumps left in the buffer, when a referenced label was never
    /// bound, or when a label is bound twice.
    pub fn finalize(self) -> Result<Bytecode, JsError> {
        let mut targets: Vec<Option<usize>> = vec![None; self.labels.len()];
        let mut refs = vec![0u32; self.labels.len()];
        let mut instructions = Vec::with_capacity(self.instructions.len());

        for inst in self.instructions {
            if let Opcode::Label(label) = inst.opcode {
                let target = &mut targets[label.0 as usize];
                if target.is_some() {
                    return Err(label_error(format!("label {} bound twice", label)));
                }
                *target = Some(instructions.len());
                continue;
            }
            if let Some(label) = inst.opcode.jump_target() {
                refs[label.0 as usize] += 1;
            }
            instructions.push(inst);
        }

        for (idx, slot) in self.labels.iter().enumerate() {
            let label = LabelId(idx as u32);
            if refs[idx] != slot.ref_count {
                return Err(label_error(format!(
                    "label {} has reference count {} but {} jumps",
                    label, slot.ref_count, refs[idx]
                )));
            }
            if refs[idx] > 0 && targets[idx].is_none() {
                return Err(label_error(format!(
                    "label {} referenced but never bound",
                    label
                )));
            }
        }

        Ok(Bytecode {
            name: None,
            instructions,
            labels: targets,
            constants: self.constants,
            scopes: Vec::new(),
            params: Vec::new(),
            functions: Vec::new(),
            flags: FunctionFlags::default(),
        })
    }

    fn slot_mut(&mut self, label: LabelId) -> &mut LabelSlot {
        let idx = label.0 as usize;
        if idx >= self.labels.len() {
            self.labels.resize(idx + 1, LabelSlot::default());
        }
        &mut self.labels[idx]
    }

    fn forget(&mut self, opcode: &Opcode) {
        if let Some(label) = opcode.jump_target() {
            let slot = self.slot_mut(label);
            slot.ref_count = slot.ref_count.saturating_sub(1);
        }
        if let Opcode::Label(label) = opcode {
            self.slot_mut(*label).bound = false;
        }
    }
}

fn label_error(message: String) -> JsError {
    JsError::new(ErrorKind::InternalError, message)
}
