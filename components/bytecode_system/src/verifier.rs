//! Operand stack depth analysis
//!
//! Walks every reachable instruction of a [`Bytecode`] and checks that each
//! one finds enough operands, that every join point is reached with a single
//! stack shape, and that iterator operations address the innermost open
//! iterator record.

use std::collections::VecDeque;

use core_types::{ErrorKind, JsError};

use crate::bytecode::Bytecode;
use crate::opcode::Opcode;

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackReport {
    /// Deepest operand stack reached on any path
    pub max_depth: usize,
    /// Stack depth just before each reachable `return`, in instruction order
    pub return_depths: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    depth: usize,
    /// Stack index of the iterator slot of each open iterator record
    iterators: Vec<usize>,
}

/// Verifies a function and, recursively, its child functions.
pub fn verify_stack(code: &Bytecode) -> Result<StackReport, JsError> {
    for child in &code.functions {
        verify_stack(child)?;
    }

    let len = code.instructions.len();
    let mut states: Vec<Option<Frame>> = vec![None; len];
    let mut queue = VecDeque::new();
    let mut report = StackReport::default();

    merge(&mut states, &mut queue, 0, Frame { depth: 0, iterators: Vec::new() }, len)?;

    while let Some(pc) = queue.pop_front() {
        let Some(frame) = states[pc].clone() else {
            continue;
        };
        let opcode = &code.instructions[pc].opcode;
        let next = step(pc, opcode, &frame)?;
        report.max_depth = report.max_depth.max(next.depth).max(frame.depth);

        if let Some(label) = opcode.jump_target() {
            let target = code.label_target(label).ok_or_else(|| {
                verify_error(pc, format!("jump to unresolved label {}", label))
            })?;
            merge(&mut states, &mut queue, target, next.clone(), len)?;
        }
        if !opcode.is_unconditional_terminator() {
            merge(&mut states, &mut queue, pc + 1, next, len)?;
        }
    }

    report.return_depths = states
        .iter()
        .zip(&code.instructions)
        .filter(|(_, inst)| matches!(inst.opcode, Opcode::Return))
        .filter_map(|(state, _)| state.as_ref().map(|frame| frame.depth))
        .collect();
    Ok(report)
}

fn step(pc: usize, opcode: &Opcode, frame: &Frame) -> Result<Frame, JsError> {
    let mut next = frame.clone();
    match opcode {
        Opcode::IteratorCloseReturn => {
            if frame.depth == 0 {
                return Err(verify_error(pc, "stack underflow".to_string()));
            }
            let iter = next
                .iterators
                .pop()
                .ok_or_else(|| verify_error(pc, "no open iterator to close".to_string()))?;
            next.depth = iter + 1;
            return Ok(next);
        }
        Opcode::ForOfNext(offset) => {
            let expected = frame.depth.checked_sub(3 + *offset as usize);
            if expected.is_none() || frame.iterators.last().copied() != expected {
                return Err(verify_error(
                    pc,
                    format!("for_of_next {} does not address the innermost iterator", offset),
                ));
            }
        }
        Opcode::IteratorClose => {
            let expected = frame.depth.checked_sub(3);
            if expected.is_none() || frame.iterators.last().copied() != expected {
                return Err(verify_error(
                    pc,
                    "iterator_close does not address the innermost iterator".to_string(),
                ));
            }
            next.iterators.pop();
        }
        Opcode::CopyDataProperties {
            target,
            source,
            exclude,
        } => {
            let deepest = (*target).max(*source).max(*exclude) as usize;
            if deepest >= frame.depth {
                return Err(verify_error(pc, "copy_data_properties offset out of range".to_string()));
            }
        }
        _ => {}
    }

    let (pops, pushes) = opcode
        .stack_effect()
        .ok_or_else(|| verify_error(pc, format!("no static stack effect for {}", opcode)))?;
    if pops > frame.depth {
        return Err(verify_error(
            pc,
            format!("stack underflow: {} needs {} operands, depth is {}", opcode, pops, frame.depth),
        ));
    }
    next.depth = frame.depth - pops + pushes;
    if let Some(open) = next.iterators.last() {
        if *open >= next.depth && !matches!(opcode, Opcode::IteratorClose) {
            return Err(verify_error(pc, format!("{} consumes an open iterator record", opcode)));
        }
    }
    if matches!(opcode, Opcode::ForOfStart) {
        next.iterators.push(frame.depth - 1);
    }
    Ok(next)
}

fn merge(
    states: &mut [Option<Frame>],
    queue: &mut VecDeque<usize>,
    pc: usize,
    frame: Frame,
    len: usize,
) -> Result<(), JsError> {
    if pc >= len {
        return Err(verify_error(pc, "control runs past the last instruction".to_string()));
    }
    match &states[pc] {
        Some(existing) if *existing == frame => Ok(()),
        Some(existing) => Err(verify_error(
            pc,
            format!(
                "inconsistent stack depth at join: {} vs {}",
                existing.depth, frame.depth
            ),
        )),
        None => {
            states[pc] = Some(frame);
            queue.push_back(pc);
            Ok(())
        }
    }
}

fn verify_error(pc: usize, message: String) -> JsError {
    JsError::new(
        ErrorKind::InternalError,
        format!("stack verification failed at {:04}: {}", pc, message),
    )
}
