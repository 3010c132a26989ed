//! `POP`, `DUP`, `ROLL` handlers.

use super::JumpTable;
use crate::error::{GruntError, GruntResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::{Instruction, Operand};
use crate::op_code::OpCode;
use crate::output::EventSink;

pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::POP, pop);
    table.register(OpCode::DUP, dup);
    table.register(OpCode::ROLL, roll);
}

fn repetition(instr: &Instruction, name: &'static str) -> GruntResult<u16> {
    match instr.operand {
        Operand::Repetition(r) => Ok(r),
        other => Err(GruntError::invalid_literal(name, format!("expected a repetition count, got {other:?}"))),
    }
}

fn pop(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let r = repetition(instr, "POP")?;
    if r == 0 {
        return Err(GruntError::invalid_literal("POP", "repetition count must be >= 1, got 0"));
    }
    for _ in 0..r {
        engine.stack().pop()?;
    }
    Ok(())
}

fn dup(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let r = repetition(instr, "DUP")?;
    if r == 0 {
        return Err(GruntError::invalid_literal("DUP", "repetition count must be >= 1, got 0"));
    }
    engine.stack().dup(r)
}

fn roll(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let r = repetition(instr, "ROLL")?;
    if r < 2 {
        return Err(GruntError::invalid_literal("ROLL", format!("repetition count must be >= 2, got {r}")));
    }
    engine.stack().roll(r)
}
