//! Error types for the Grunt virtual machine.
//!
//! A Grunt program can only ever fail in one of a small, closed set of ways;
//! this module gives each of them its own variant so callers can match on the
//! fault instead of parsing a message.

use thiserror::Error;

/// A fault raised by the VM while fetching or executing an instruction.
///
/// Every fault is terminal: the run loop stops and surfaces the fault to the
/// host. Nothing is retried or recovered locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GruntError {
    /// The fetched opcode byte is outside the defined instruction set.
    #[error("invalid opcode {opcode:#04x} at pc {pc}")]
    InvalidOpcode { pc: u16, opcode: u8 },

    /// A literal operand has the wrong variant, or is outside the range the
    /// instruction permits (`DUP(0)`, `ROLL(1)`, `INPUT(3)`, `JMPIF` lit < 2, ...).
    #[error("invalid literal for {instruction}: {reason}")]
    InvalidLiteral { instruction: &'static str, reason: String },

    /// An operation found a stack value of the wrong tag (`ADD` on a `Bool`,
    /// `OUTPUT` of a `PC`, `HALT` on a non-`Bool`).
    #[error("invalid argument for {instruction}: {reason}")]
    InvalidArgument { instruction: &'static str, reason: String },

    /// A `CALL` target was not strictly greater than the post-increment `pc`.
    #[error("CALL target {target} is not forward of pc {current}")]
    NoLoops { current: u16, target: u16 },

    /// `pc` would advance past the end of the program without a `HALT`.
    #[error("pc {pc} out of range for a program of {len} instructions")]
    NoProgram { pc: u16, len: u16 },

    /// Stack over/underflow, input read past the end, rewind before the
    /// start, output buffer overflow, or arithmetic over/underflow.
    #[error("out of bounds in {context}: {reason}")]
    OutOfBounds { context: &'static str, reason: String },

    /// A precondition the VM itself enforces (not the program) was violated.
    #[error("interpreter bug in {context}: {reason}")]
    InterpreterBug { context: &'static str, reason: String },
}

/// Result type used throughout the VM's internals.
pub type GruntResult<T> = std::result::Result<T, GruntError>;

impl GruntError {
    /// Builds an [`GruntError::InvalidLiteral`].
    pub fn invalid_literal<S: Into<String>>(instruction: &'static str, reason: S) -> Self {
        Self::InvalidLiteral { instruction, reason: reason.into() }
    }

    /// Builds an [`GruntError::InvalidArgument`].
    pub fn invalid_argument<S: Into<String>>(instruction: &'static str, reason: S) -> Self {
        Self::InvalidArgument { instruction, reason: reason.into() }
    }

    /// Builds an [`GruntError::OutOfBounds`].
    pub fn out_of_bounds<S: Into<String>>(context: &'static str, reason: S) -> Self {
        Self::OutOfBounds { context, reason: reason.into() }
    }

    /// Builds an [`GruntError::InterpreterBug`].
    pub fn interpreter_bug<S: Into<String>>(context: &'static str, reason: S) -> Self {
        Self::InterpreterBug { context, reason: reason.into() }
    }

    /// The status code this fault maps to at the host boundary (§7).
    pub fn category(&self) -> &'static str {
        match self {
            GruntError::InvalidOpcode { .. } => "InvalidOpcode",
            GruntError::InvalidLiteral { .. } => "InvalidLiteral",
            GruntError::InvalidArgument { .. } => "InvalidArgument",
            GruntError::NoLoops { .. } => "NoLoops",
            GruntError::NoProgram { .. } => "NoProgram",
            GruntError::OutOfBounds { .. } => "OutOfBounds",
            GruntError::InterpreterBug { .. } => "InterpreterBug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = GruntError::invalid_literal("DUP", "repetition count must be >= 1, got 0");
        assert_eq!(
            err.to_string(),
            "invalid literal for DUP: repetition count must be >= 1, got 0"
        );
    }

    #[test]
    fn category_matches_variant() {
        assert_eq!(GruntError::NoLoops { current: 4, target: 2 }.category(), "NoLoops");
        assert_eq!(
            GruntError::NoProgram { pc: 10, len: 10 }.category(),
            "NoProgram"
        );
    }
}
