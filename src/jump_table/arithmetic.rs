//! `ADD`, `SUB` handlers.

use super::JumpTable;
use crate::error::{GruntError, GruntResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use crate::output::EventSink;
use crate::value::{Value, NUM_MAX};

pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::ADD, add);
    table.register(OpCode::SUB, sub);
}

fn pop_two_nums(engine: &mut ExecutionEngine, name: &'static str) -> GruntResult<(u32, u32)> {
    // Stack contract `Num(a) Num(b) -- ...`: b was pushed last, on top.
    let b = engine.stack().pop()?;
    let a = engine.stack().pop()?;
    let b = b.as_num().ok_or_else(|| GruntError::invalid_argument(name, format!("expected Num, got {}", b.type_name())))?;
    let a = a.as_num().ok_or_else(|| GruntError::invalid_argument(name, format!("expected Num, got {}", a.type_name())))?;
    Ok((a, b))
}

fn add(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let (a, b) = pop_two_nums(engine, "ADD")?;
    if b > NUM_MAX - a {
        return Err(GruntError::out_of_bounds("ADD", format!("{a} + {b} overflows NUM_MAX ({NUM_MAX})")));
    }
    engine.stack().push(Value::Num(a + b))
}

fn sub(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let (a, b) = pop_two_nums(engine, "SUB")?;
    if a < b {
        return Err(GruntError::out_of_bounds("SUB", format!("{a} - {b} underflows")));
    }
    engine.stack().push(Value::Num(a - b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Program, StringTable};

    fn noop_sink(_: u32, _: crate::value::Severity, _: &[u8]) {}

    #[test]
    fn add_pops_b_then_a_and_pushes_the_sum() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.stack().push(Value::Num(3)).unwrap();
        engine.stack().push(Value::Num(4)).unwrap();
        add(&mut engine, &Instruction::add(), &mut noop_sink).unwrap();
        assert_eq!(engine.stack().pop().unwrap(), Value::Num(7));
    }

    #[test]
    fn add_overflowing_num_max_is_out_of_bounds() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.stack().push(Value::Num(NUM_MAX)).unwrap();
        engine.stack().push(Value::Num(1)).unwrap();
        let err = add(&mut engine, &Instruction::add(), &mut noop_sink).unwrap_err();
        assert!(matches!(err, GruntError::OutOfBounds { .. }));
    }

    #[test]
    fn sub_computes_a_minus_b() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.stack().push(Value::Num(10)).unwrap();
        engine.stack().push(Value::Num(4)).unwrap();
        sub(&mut engine, &Instruction::sub(), &mut noop_sink).unwrap();
        assert_eq!(engine.stack().pop().unwrap(), Value::Num(6));
    }

    #[test]
    fn sub_underflowing_below_zero_is_out_of_bounds() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.stack().push(Value::Num(2)).unwrap();
        engine.stack().push(Value::Num(5)).unwrap();
        let err = sub(&mut engine, &Instruction::sub(), &mut noop_sink).unwrap_err();
        assert!(matches!(err, GruntError::OutOfBounds { .. }));
    }

    #[test]
    fn add_rejects_non_num_operands() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.stack().push(Value::Bool(true)).unwrap();
        engine.stack().push(Value::Num(1)).unwrap();
        let err = add(&mut engine, &Instruction::add(), &mut noop_sink).unwrap_err();
        assert!(matches!(err, GruntError::InvalidArgument { .. }));
    }
}
