//! The public status vocabulary exposed at the VM boundary (§6, §7).

use crate::error::GruntError;

/// The externally visible outcome of a run.
///
/// `HaltTrue`/`HaltFalse` are the two normal terminations; everything else
/// is a fault. This is the return type of [`crate::execution_engine::run`];
/// internally the engine works with [`GruntError`] so that fault sites carry
/// structured detail, and collapses to this flatter vocabulary only at the
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The program halted with `true` on top of the argument stack.
    HaltTrue,
    /// The program halted with `false` on top of the argument stack.
    HaltFalse,
    /// A precondition the VM itself enforces was violated.
    InterpreterBug,
    /// A stack top (or `HALT`'s argument) had the wrong tag.
    InvalidArgument,
    /// A literal operand had the wrong tag or an out-of-range count.
    InvalidLiteral,
    /// The fetched opcode is outside the defined instruction set.
    InvalidOpcode,
    /// A `CALL` target was not strictly forward of the current `pc`.
    NoLoops,
    /// `pc` advanced past the end of the program without a `HALT`.
    NoProgram,
    /// Stack, input, or output bounds were exceeded, or arithmetic
    /// over/underflowed.
    OutOfBounds,
}

impl Status {
    /// Whether this status represents a successful validation.
    pub fn is_halt_true(&self) -> bool {
        matches!(self, Status::HaltTrue)
    }
}

impl From<GruntError> for Status {
    fn from(err: GruntError) -> Self {
        match err {
            GruntError::InvalidOpcode { .. } => Status::InvalidOpcode,
            GruntError::InvalidLiteral { .. } => Status::InvalidLiteral,
            GruntError::InvalidArgument { .. } => Status::InvalidArgument,
            GruntError::NoLoops { .. } => Status::NoLoops,
            GruntError::NoProgram { .. } => Status::NoProgram,
            GruntError::OutOfBounds { .. } => Status::OutOfBounds,
            GruntError::InterpreterBug { .. } => Status::InterpreterBug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_halt_true_is_halt_true() {
        assert!(Status::HaltTrue.is_halt_true());
        assert!(!Status::HaltFalse.is_halt_true());
        assert!(!Status::OutOfBounds.is_halt_true());
    }

    #[test]
    fn every_error_variant_maps_to_its_own_status() {
        assert_eq!(Status::from(GruntError::InvalidOpcode { pc: 0, opcode: 0xFF }), Status::InvalidOpcode);
        assert_eq!(
            Status::from(GruntError::invalid_literal("DUP", "n must be >= 1")),
            Status::InvalidLiteral
        );
        assert_eq!(
            Status::from(GruntError::invalid_argument("HALT", "top was not Bool")),
            Status::InvalidArgument
        );
        assert_eq!(Status::from(GruntError::NoLoops { current: 4, target: 2 }), Status::NoLoops);
        assert_eq!(Status::from(GruntError::NoProgram { pc: 10, len: 10 }), Status::NoProgram);
        assert_eq!(
            Status::from(GruntError::out_of_bounds("arg_pop", "argument stack is empty")),
            Status::OutOfBounds
        );
        assert_eq!(
            Status::from(GruntError::interpreter_bug("arg_dup", "n must be >= 1")),
            Status::InterpreterBug
        );
    }
}
