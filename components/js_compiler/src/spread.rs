//! Rest element accumulation loop

use bytecode_system::Opcode;

use crate::unit::CompilationUnit;

/// Drains the innermost iterator into a fresh array.
///
/// `depth` is the number of receiver slots between the iterator record and
/// the point where the array is pushed.
///
/// `iter next catch r.. -- iter next catch r.. array`
pub fn emit_spread(unit: &mut CompilationUnit, depth: u8) {
    let chunk = &mut unit.chunk;
    chunk.emit(Opcode::ArrayFrom(0));
    chunk.emit(Opcode::PushI32(0));
    let next = chunk.new_label();
    chunk.emit_label(next);
    chunk.emit(Opcode::ForOfNext(2 + depth));
    let done = chunk.emit_goto(Opcode::IfTrue);
    // array idx value -- array idx
    chunk.emit(Opcode::DefineArrayEl);
    chunk.emit(Opcode::Inc);
    chunk.emit(Opcode::Goto(next));
    chunk.emit_label(done);
    // array idx undefined -- array
    chunk.emit(Opcode::Drop);
    chunk.emit(Opcode::Drop);
}
