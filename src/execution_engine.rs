//! The VM step and run loop (§4.6).

use crate::error::{GruntError, GruntResult};
use crate::input::InputWindow;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::output::{EventSink, OutputQueue};
use crate::program::{Program, StringTable};
use crate::stack::DualStack;
use crate::status::Status;

/// The interpreter state for one run.
///
/// Created fresh at run entry and discarded at run exit (§3 Lifecycle);
/// there is no persistent VM state between runs and no global mutable
/// state at all, so concurrent VM instances need nothing beyond one of
/// these each.
pub struct ExecutionEngine<'p, 'b, 's> {
    program: &'p Program,
    strings: StringTable<'s>,
    stack: DualStack,
    input: InputWindow<'b>,
    output: OutputQueue,
    pc: u16,
    /// Set by `HALT` to stop the run loop with a verdict.
    halted: Option<bool>,
}

impl<'p, 'b, 's> ExecutionEngine<'p, 'b, 's> {
    /// Creates the engine for one run over `program`, reading from `image`
    /// and rendering output against `strings`.
    pub fn new(program: &'p Program, image: &'b [u8], strings: StringTable<'s>) -> Self {
        Self {
            program,
            strings,
            stack: DualStack::new(),
            input: InputWindow::new(image),
            output: OutputQueue::new(),
            pc: 0,
            halted: None,
        }
    }

    /// The program being executed.
    pub fn program(&self) -> &Program {
        self.program
    }

    /// The program's string table.
    pub fn strings(&self) -> &StringTable<'s> {
        &self.strings
    }

    /// The argument/control stack.
    pub fn stack(&mut self) -> &mut DualStack {
        &mut self.stack
    }

    /// The input window over the image.
    pub fn input(&mut self) -> &mut InputWindow<'b> {
        &mut self.input
    }

    /// The output line under construction.
    pub fn output(&mut self) -> &mut OutputQueue {
        &mut self.output
    }

    /// The current program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets `pc` directly. Used by `CALL`, `JMPIF`, and `RETURN` to reposition
    /// execution after the ordinary pre-dispatch increment has already run.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Records the run's verdict and stops the run loop.
    pub fn set_halted(&mut self, verdict: bool) {
        self.halted = Some(verdict);
    }

    /// Drives the run loop to completion and returns the boundary status.
    ///
    /// Each iteration: record the current `pc`, bounds-check it, fetch the
    /// instruction, pre-increment `pc` so ordinary instructions fall
    /// through, dispatch to the opcode's handler, then — unless the handler
    /// already repositioned `pc` itself — nothing further happens, since the
    /// increment already took place before dispatch. This ordering, not a
    /// post-hoc check, is what makes the loop-freedom argument in §4.6 hold:
    /// `CALL` reasons about the *already incremented* `pc`.
    pub fn execute(&mut self, jump_table: &JumpTable, sink: &mut dyn EventSink) -> Status {
        loop {
            match self.execute_next(jump_table, sink) {
                Ok(Some(verdict)) => return if verdict { Status::HaltTrue } else { Status::HaltFalse },
                Ok(None) => continue,
                Err(err) => {
                    log::debug!("grunt vm fault at pc {}: {err}", self.pc);
                    return Status::from(err);
                }
            }
        }
    }

    /// Executes a single instruction. Returns `Ok(Some(verdict))` if `HALT`
    /// fired, `Ok(None)` if the run should continue, or the fault that ended
    /// the run.
    fn execute_next(
        &mut self,
        jump_table: &JumpTable,
        sink: &mut dyn EventSink,
    ) -> GruntResult<Option<bool>> {
        let current_pc = self.pc;
        let len = self.program.len();
        if current_pc as usize >= len {
            return Err(GruntError::NoProgram { pc: current_pc, len: len as u16 });
        }

        let instruction: Instruction = *self
            .program
            .get(current_pc)
            .expect("current_pc was just bounds-checked against program.len()");

        // Pre-increment before dispatch: CALL/JMPIF reason about this
        // already-advanced pc, not the fetch address.
        self.pc = current_pc + 1;
        self.halted = None;

        let handler = jump_table.get(instruction.opcode).ok_or_else(|| {
            GruntError::InvalidOpcode { pc: current_pc, opcode: instruction.opcode as u8 }
        })?;

        handler(self, &instruction, sink)?;

        Ok(self.halted)
    }
}
