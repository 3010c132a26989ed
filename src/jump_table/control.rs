//! `CALL`, `RETURN`, `JMPIF`, `HALT` — the only opcodes that touch `pc` or
//! the control stack. Together these enforce the loop-freedom invariant
//! (§4.6): `CALL` only ever moves `pc` forward, and `JMPIF`'s relative
//! offset is unsigned and at least 1 after its `-1` rebias.

use super::JumpTable;
use crate::error::{GruntError, GruntResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::{Instruction, Operand};
use crate::op_code::OpCode;
use crate::output::EventSink;
use crate::value::Value;

pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::CALL, call);
    table.register(OpCode::RETURN, ret);
    table.register(OpCode::JMPIF, jmpif);
    table.register(OpCode::HALT, halt);
}

fn pc_literal(instr: &Instruction, name: &'static str) -> GruntResult<u16> {
    match instr.operand {
        Operand::Literal(Value::Pc(p)) => Ok(p),
        other => Err(GruntError::invalid_literal(name, format!("expected a Pc literal, got {other:?}"))),
    }
}

fn call(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let target = pc_literal(instr, "CALL")?;
    let current = engine.pc();
    if target < current {
        return Err(GruntError::NoLoops { current, target });
    }
    engine.stack().ctl_push(current)?;
    engine.set_pc(target);
    Ok(())
}

fn ret(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let target = engine.stack().ctl_pop()?;
    engine.set_pc(target);
    Ok(())
}

fn jmpif(engine: &mut ExecutionEngine, instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let lit = pc_literal(instr, "JMPIF")?;
    if lit < 2 {
        return Err(GruntError::invalid_literal("JMPIF", format!("relative offset must be >= 2, got {lit}")));
    }
    let v = engine.stack().pop()?;
    let b = v.as_bool().ok_or_else(|| GruntError::invalid_argument("JMPIF", format!("expected Bool, got {}", v.type_name())))?;
    if !b {
        return Ok(());
    }
    let current = engine.pc();
    if lit > u16::MAX - current {
        return Err(GruntError::NoProgram { pc: current, len: u16::MAX });
    }
    engine.set_pc(current + (lit - 1));
    Ok(())
}

fn halt(engine: &mut ExecutionEngine, _instr: &Instruction, _sink: &mut dyn EventSink) -> GruntResult<()> {
    let v = engine.stack().pop()?;
    let b = v.as_bool().ok_or_else(|| GruntError::invalid_argument("HALT", format!("expected Bool, got {}", v.type_name())))?;
    engine.set_halted(b);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Program, StringTable};

    fn noop_sink(_: u32, _: crate::value::Severity, _: &[u8]) {}

    /// `engine.pc()` inside a handler is already post-increment (see
    /// `execution_engine::execute_next`), so a `CALL` whose literal equals
    /// it targets the very next instruction and is a valid forward call.
    #[test]
    fn call_to_the_next_instruction_is_forward_not_backward() {
        let program = Program::new(vec![Instruction::halt(); 8]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.set_pc(5);
        call(&mut engine, &Instruction::call(5), &mut noop_sink).unwrap();
        assert_eq!(engine.pc(), 5);
        assert_eq!(engine.stack().ctl_pop().unwrap(), 5);
    }

    #[test]
    fn call_targeting_a_prior_address_is_no_loops() {
        let program = Program::new(vec![Instruction::halt(); 8]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.set_pc(5);
        let err = call(&mut engine, &Instruction::call(3), &mut noop_sink).unwrap_err();
        assert!(matches!(err, GruntError::NoLoops { current: 5, target: 3 }));
    }

    #[test]
    fn ret_with_empty_control_stack_is_out_of_bounds() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        assert!(matches!(ret(&mut engine, &Instruction::ret(), &mut noop_sink), Err(GruntError::OutOfBounds { .. })));
    }

    #[test]
    fn jmpif_rejects_a_literal_below_two() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        let err = jmpif(&mut engine, &Instruction::jmpif(1), &mut noop_sink).unwrap_err();
        assert!(matches!(err, GruntError::InvalidLiteral { .. }));
    }

    #[test]
    fn jmpif_false_condition_leaves_pc_untouched() {
        let program = Program::new(vec![Instruction::halt(); 4]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.set_pc(2);
        engine.stack().push(Value::Bool(false)).unwrap();
        jmpif(&mut engine, &Instruction::jmpif(2), &mut noop_sink).unwrap();
        assert_eq!(engine.pc(), 2);
    }

    #[test]
    fn jmpif_true_condition_advances_pc_by_the_rebiased_offset() {
        let program = Program::new(vec![Instruction::halt(); 10]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.set_pc(2);
        engine.stack().push(Value::Bool(true)).unwrap();
        jmpif(&mut engine, &Instruction::jmpif(3), &mut noop_sink).unwrap();
        assert_eq!(engine.pc(), 2 + (3 - 1));
    }

    /// `JMPIF` near the top of the address space, whose offset would carry
    /// `pc` past `u16::MAX`, is `NoProgram` rather than wrapping.
    #[test]
    fn jmpif_overflowing_u16_is_no_program() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.set_pc(u16::MAX - 1);
        engine.stack().push(Value::Bool(true)).unwrap();
        let err = jmpif(&mut engine, &Instruction::jmpif(3), &mut noop_sink).unwrap_err();
        assert!(matches!(err, GruntError::NoProgram { .. }));
    }

    #[test]
    fn halt_requires_a_bool_argument() {
        let program = Program::new(vec![Instruction::halt()]);
        let strings: [&str; 0] = [];
        let table = StringTable::new(&strings);
        let mut engine = ExecutionEngine::new(&program, &[], table);
        engine.stack().push(Value::Num(1)).unwrap();
        assert!(matches!(halt(&mut engine, &Instruction::halt(), &mut noop_sink), Err(GruntError::InvalidArgument { .. })));
    }
}
