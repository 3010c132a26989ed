//! `INPUT`, `REWIND`, `OUTPUT`, `FLUSH` handlers — the only opcodes that
//! reach the input window, the output queue, or the event sink.

use super::JumpTable;
use crate::error::{GruntError, GruntResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::{Instruction, Operand};
use crate::op_code::OpCode;
use crate::output::EventSink;
use crate::value::Value;

pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::INPUT, input);
    table.register(OpCode::REWIND, rewind);
    table.register(OpCode::OUTPUT, output);
    table.register(OpCode::FLUSH, flush);
}

fn repetition(instr: &Instruction, name: &'static str) -> GruntResult<u16> {
    match instr.operand {
        Operand::Repetition(r) => Ok(r),
        other => Err(GruntError::invalid_literal(name, format!("expected a repetition count, got {other:?}"))),
    }
}

fn input(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let r = repetition(instr, "INPUT")?;
    let value = engine.input().dequeue(r)?;
    engine.stack().push(value)
}

fn rewind(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let r = repetition(instr, "REWIND")?;
    engine.input().rewind(r)
}

fn output(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let v = engine.stack().pop()?;
    match v {
        Value::Bool(b) => engine.output().append_bool(b),
        Value::Num(n) => engine.output().append_number(n),
        Value::Str(i) => {
            let strings = *engine.strings();
            engine.output().append_string(i, &strings)
        }
        Value::Pc(_) => Err(GruntError::invalid_argument("OUTPUT", "cannot render a Pc value")),
    }
}

fn flush(engine: &mut ExecutionEngine, _instr: &Instruction, sink: &mut dyn EventSink) -> GruntResult<()> {
    // Stack contract: `severity event_id -- `; event_id was pushed last and
    // is popped first.
    let event_id = engine.stack().pop()?;
    let severity = engine.stack().pop()?;
    let event_id = event_id
        .as_num()
        .ok_or_else(|| GruntError::invalid_argument("FLUSH", "event_id must be a Num"))?;
    let severity = severity
        .as_num()
        .ok_or_else(|| GruntError::invalid_argument("FLUSH", "severity must be a Num"))?;
    engine.output().flush(event_id, severity, sink);
    Ok(())
}
