//! `PUSHB`, `PUSHN`, `PUSHS` handlers.

use super::JumpTable;
use crate::error::{GruntError, GruntResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::{Instruction, Operand};
use crate::op_code::OpCode;
use crate::output::EventSink;
use crate::value::Value;

pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::PUSHB, pushb);
    table.register(OpCode::PUSHN, pushn);
    table.register(OpCode::PUSHS, pushs);
}

fn pushb(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    match instr.operand {
        Operand::Literal(v @ Value::Bool(_)) => engine.stack().push(v),
        other => Err(GruntError::invalid_literal("PUSHB", format!("expected a Bool literal, got {other:?}"))),
    }
}

fn pushn(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    match instr.operand {
        Operand::Literal(v @ Value::Num(_)) => engine.stack().push(v),
        other => Err(GruntError::invalid_literal("PUSHN", format!("expected a Num literal, got {other:?}"))),
    }
}

fn pushs(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    match instr.operand {
        Operand::Literal(v @ Value::Str(_)) => engine.stack().push(v),
        other => Err(GruntError::invalid_literal("PUSHS", format!("expected a Str literal, got {other:?}"))),
    }
}
