//! Instruction dispatch: one handler function per opcode, looked up by
//! opcode byte in a fixed 256-entry table (§4.5).

mod arithmetic;
mod control;
mod io_ops;
mod logic;
mod push_ops;
mod stack_ops;

use crate::error::GruntResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use crate::output::EventSink;

/// A handler for one opcode.
pub type InstructionHandler =
    fn(&mut ExecutionEngine<'_, '_, '_>, &Instruction, &mut dyn EventSink) -> GruntResult<()>;

/// Maps opcode bytes to their handlers.
///
/// Unassigned bytes carry no handler at all; the run loop turns a missing
/// entry into `InvalidOpcode` itself; this table never needs an explicit
/// "unknown opcode" handler of its own.
#[derive(Clone)]
pub struct JumpTable {
    handlers: [Option<InstructionHandler>; 256],
}

impl JumpTable {
    /// Builds the table with every defined opcode registered.
    pub fn new() -> Self {
        let mut table = Self { handlers: [None; 256] };
        push_ops::register_handlers(&mut table);
        stack_ops::register_handlers(&mut table);
        io_ops::register_handlers(&mut table);
        arithmetic::register_handlers(&mut table);
        logic::register_handlers(&mut table);
        control::register_handlers(&mut table);
        table
    }

    /// Registers `handler` for `opcode`.
    pub fn register(&mut self, opcode: OpCode, handler: InstructionHandler) {
        self.handlers[opcode as usize] = Some(handler);
    }

    /// Looks up the handler for `opcode`, if one is registered.
    pub fn get(&self, opcode: OpCode) -> Option<InstructionHandler> {
        self.handlers[opcode as usize]
    }
}

impl Default for JumpTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_defined_opcode_has_a_handler() {
        let table = JumpTable::new();
        for op in OpCode::iter() {
            assert!(table.get(op).is_some(), "no handler registered for {op:?}");
        }
    }
}
