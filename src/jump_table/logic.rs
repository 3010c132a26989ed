//! `EQ`, `LT`, `GT`, `AND`, `OR`, `NOT` handlers.

use super::JumpTable;
use crate::error::{GruntError, GruntResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::{Instruction, Operand};
use crate::op_code::OpCode;
use crate::output::EventSink;
use crate::value::Value;

pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::EQ, eq);
    table.register(OpCode::LT, lt);
    table.register(OpCode::GT, gt);
    table.register(OpCode::AND, and);
    table.register(OpCode::OR, or);
    table.register(OpCode::NOT, not);
}

fn repetition(instr: &Instruction, name: &'static str) -> GruntResult<u16> {
    match instr.operand {
        Operand::Repetition(r) => Ok(r),
        other => Err(GruntError::invalid_literal(name, format!("expected a repetition count, got {other:?}"))),
    }
}

fn eq(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let r = repetition(instr, "EQ")?;
    if r < 2 {
        return Err(GruntError::invalid_literal("EQ", format!("repetition count must be >= 2, got {r}")));
    }
    let first = engine.stack().pop()?;
    let first = first.as_num().ok_or_else(|| GruntError::invalid_argument("EQ", format!("expected Num, got {}", first.type_name())))?;
    let mut all_equal = true;
    for _ in 1..r {
        let next = engine.stack().pop()?;
        let next = next.as_num().ok_or_else(|| GruntError::invalid_argument("EQ", format!("expected Num, got {}", next.type_name())))?;
        if next != first {
            all_equal = false;
        }
    }
    engine.stack().push(Value::Bool(all_equal))
}

fn lt(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    compare(engine, true)
}

fn gt(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    compare(engine, false)
}

/// `Num(a) Num(b) -- Bool(...)`: `b` is on top and is popped first.
fn compare(engine: &mut ExecutionEngine, less_than: bool) -> GruntResult<()> {
    let name = if less_than { "LT" } else { "GT" };
    let b = engine.stack().pop()?;
    let a = engine.stack().pop()?;
    let b = b.as_num().ok_or_else(|| GruntError::invalid_argument(name, format!("expected Num, got {}", b.type_name())))?;
    let a = a.as_num().ok_or_else(|| GruntError::invalid_argument(name, format!("expected Num, got {}", a.type_name())))?;
    let result = if less_than { a < b } else { a > b };
    engine.stack().push(Value::Bool(result))
}

fn and(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    combine(engine, instr, true)
}

fn or(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    combine(engine, instr, false)
}

fn combine(engine: &mut ExecutionEngine, instr: &Instruction, conjunction: bool) -> GruntResult<()> {
    let name = if conjunction { "AND" } else { "OR" };
    let r = repetition(instr, name)?;
    if r < 2 {
        return Err(GruntError::invalid_literal(name, format!("repetition count must be >= 2, got {r}")));
    }
    let first = engine.stack().pop()?;
    let mut acc = first.as_bool().ok_or_else(|| GruntError::invalid_argument(name, format!("expected Bool, got {}", first.type_name())))?;
    for _ in 1..r {
        let next = engine.stack().pop()?;
        let next = next.as_bool().ok_or_else(|| GruntError::invalid_argument(name, format!("expected Bool, got {}", next.type_name())))?;
        acc = if conjunction { acc && next } else { acc || next };
    }
    engine.stack().push(Value::Bool(acc))
}

fn not(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let v = engine.stack().pop()?;
    let b = v.as_bool().ok_or_else(|| GruntError::invalid_argument("NOT", format!("expected Bool, got {}", v.type_name())))?;
    engine.stack().push(Value::Bool(!b))
}
