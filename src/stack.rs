//! The dual stack: one backing array split into an argument stack growing
//! up from index 0 and a control stack growing down from the top (§3, §4.2).

use crate::error::GruntError;
use crate::value::Value;

/// `K`, the fixed number of slots shared by both stacks.
pub const CAPACITY: usize = 32;

/// The argument stack and the control stack, packed into one backing array.
///
/// Invariant: `argc + ctlc <= CAPACITY` at all times. The argument stack
/// never holds a `Pc`; the control stack never holds anything else.
/// Crossing that line is an [`GruntError::InterpreterBug`], not a program
/// error, because it can only happen from a bug in this module's own callers.
#[derive(Debug, Clone)]
pub struct DualStack {
    slots: [Value; CAPACITY],
    argc: usize,
    ctlc: usize,
}

impl DualStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self { slots: [Value::Bool(false); CAPACITY], argc: 0, ctlc: 0 }
    }

    /// Number of values on the argument stack.
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Number of values on the control stack.
    pub fn ctlc(&self) -> usize {
        self.ctlc
    }

    /// Pushes `v` onto the argument stack.
    pub fn push(&mut self, v: Value) -> Result<(), GruntError> {
        if !v.is_argument_value() {
            return Err(GruntError::interpreter_bug(
                "arg_push",
                "a Pc value cannot live on the argument stack",
            ));
        }
        if self.argc + self.ctlc >= CAPACITY {
            return Err(GruntError::out_of_bounds("arg_push", "argument stack is full"));
        }
        self.slots[self.argc] = v;
        self.argc += 1;
        Ok(())
    }

    /// Pops the top of the argument stack.
    pub fn pop(&mut self) -> Result<Value, GruntError> {
        if self.argc == 0 {
            return Err(GruntError::out_of_bounds("arg_pop", "argument stack is empty"));
        }
        self.argc -= 1;
        Ok(self.slots[self.argc])
    }

    /// Duplicates the top `n` argument slots, preserving order
    /// (`x y z` with `n=2` becomes `x y z y z`). Requires `n >= 1`.
    pub fn dup(&mut self, n: u16) -> Result<(), GruntError> {
        let n = n as usize;
        if n == 0 {
            return Err(GruntError::interpreter_bug("arg_dup", "n must be >= 1"));
        }
        if self.argc < n {
            return Err(GruntError::out_of_bounds(
                "arg_dup",
                format!("requested {n} items, only {} available", self.argc),
            ));
        }
        if self.argc + self.ctlc + n > CAPACITY {
            return Err(GruntError::out_of_bounds("arg_dup", "not enough room to duplicate"));
        }
        for i in 0..n {
            self.slots[self.argc + i] = self.slots[self.argc - n + i];
        }
        self.argc += n;
        Ok(())
    }

    /// Rotates the top `n` argument slots so the topmost becomes the
    /// `n`-th from the top (`w x y z` with `n=3` becomes `w z x y`).
    /// Requires `n >= 2`.
    pub fn roll(&mut self, n: u16) -> Result<(), GruntError> {
        let n = n as usize;
        if n < 2 {
            return Err(GruntError::interpreter_bug("arg_roll", "n must be >= 2"));
        }
        if self.argc < n {
            return Err(GruntError::out_of_bounds(
                "arg_roll",
                format!("requested {n} items, only {} available", self.argc),
            ));
        }
        let top = self.slots[self.argc - 1];
        for i in (1..n).rev() {
            self.slots[self.argc - n + i] = self.slots[self.argc - n + i - 1];
        }
        self.slots[self.argc - n] = top;
        Ok(())
    }

    /// Pushes a return address onto the control stack.
    pub fn ctl_push(&mut self, pc: u16) -> Result<(), GruntError> {
        if self.argc + self.ctlc >= CAPACITY {
            return Err(GruntError::out_of_bounds("ctl_push", "control stack is full"));
        }
        self.slots[CAPACITY - 1 - self.ctlc] = Value::Pc(pc);
        self.ctlc += 1;
        Ok(())
    }

    /// Pops the top of the control stack.
    pub fn ctl_pop(&mut self) -> Result<u16, GruntError> {
        if self.ctlc == 0 {
            return Err(GruntError::out_of_bounds("ctl_pop", "control stack is empty"));
        }
        self.ctlc -= 1;
        match self.slots[CAPACITY - 1 - self.ctlc] {
            Value::Pc(p) => Ok(p),
            _ => Err(GruntError::interpreter_bug(
                "ctl_pop",
                "control stack slot did not hold a Pc",
            )),
        }
    }
}

impl Default for DualStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn push_pop_round_trips() {
        let mut s = DualStack::new();
        s.push(Value::Num(7)).unwrap();
        s.push(Value::Bool(true)).unwrap();
        assert_eq!(s.pop().unwrap(), Value::Bool(true));
        assert_eq!(s.pop().unwrap(), Value::Num(7));
        assert_eq!(s.argc(), 0);
    }

    #[test]
    fn pop_empty_is_out_of_bounds() {
        let mut s = DualStack::new();
        assert!(matches!(s.pop(), Err(GruntError::OutOfBounds { .. })));
    }

    #[test]
    fn push_rejects_pc_values() {
        let mut s = DualStack::new();
        assert!(matches!(
            s.push(Value::Pc(3)),
            Err(GruntError::InterpreterBug { .. })
        ));
    }

    #[test]
    fn dup_preserves_order() {
        let mut s = DualStack::new();
        for n in [10u32, 20, 30] {
            s.push(Value::Num(n)).unwrap();
        }
        s.dup(2).unwrap();
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(s.pop().unwrap().as_num().unwrap());
        }
        assert_eq!(out, vec![30, 20, 30, 20, 10]);
    }

    #[test]
    fn roll_matches_the_textbook_example() {
        // w x y z, roll(3) -> w z x y
        let mut s = DualStack::new();
        for n in [b'w', b'x', b'y', b'z'] {
            s.push(Value::Num(n as u32)).unwrap();
        }
        s.roll(3).unwrap();
        let mut out = Vec::new();
        for _ in 0..4 {
            out.push(s.pop().unwrap().as_num().unwrap() as u8 as char);
        }
        out.reverse();
        assert_eq!(out, vec!['w', 'z', 'x', 'y']);
    }

    #[test]
    fn dup_zero_is_interpreter_bug() {
        let mut s = DualStack::new();
        s.push(Value::Num(1)).unwrap();
        assert!(matches!(s.dup(0), Err(GruntError::InterpreterBug { .. })));
    }

    #[test]
    fn roll_one_is_interpreter_bug() {
        let mut s = DualStack::new();
        s.push(Value::Num(1)).unwrap();
        assert!(matches!(s.roll(1), Err(GruntError::InterpreterBug { .. })));
    }

    #[test]
    fn control_stack_is_independent_of_argument_stack() {
        let mut s = DualStack::new();
        s.push(Value::Num(1)).unwrap();
        s.ctl_push(42).unwrap();
        assert_eq!(s.argc(), 1);
        assert_eq!(s.ctlc(), 1);
        assert_eq!(s.ctl_pop().unwrap(), 42);
        assert_eq!(s.pop().unwrap(), Value::Num(1));
    }

    #[test]
    fn full_stack_rejects_further_pushes() {
        let mut s = DualStack::new();
        for i in 0..CAPACITY {
            s.push(Value::Num(i as u32)).unwrap();
        }
        assert!(matches!(s.push(Value::Num(0)), Err(GruntError::OutOfBounds { .. })));
    }

    #[test]
    fn argument_and_control_counts_share_one_capacity() {
        let mut s = DualStack::new();
        for i in 0..16 {
            s.push(Value::Num(i)).unwrap();
        }
        for pc in 0..16 {
            s.ctl_push(pc).unwrap();
        }
        assert!(matches!(s.push(Value::Num(0)), Err(GruntError::OutOfBounds { .. })));
        assert!(matches!(s.ctl_push(0), Err(GruntError::OutOfBounds { .. })));
    }

    proptest! {
        /// `roll(n)` applied `n` times is the identity: each application is a
        /// single rotation of an `n`-cycle, so `n` of them return to start.
        #[test]
        fn roll_n_times_n_is_identity(values in prop::collection::vec(0u32..1000, 2..CAPACITY)) {
            let n = values.len() as u16;
            let mut s = DualStack::new();
            for &v in &values {
                s.push(Value::Num(v)).unwrap();
            }
            for _ in 0..n {
                s.roll(n).unwrap();
            }
            let mut out = Vec::new();
            for _ in 0..values.len() {
                out.push(s.pop().unwrap().as_num().unwrap());
            }
            out.reverse();
            prop_assert_eq!(out, values);
        }

        /// `dup(n)` always leaves the duplicated window identical to, and
        /// directly on top of, the window it copied from.
        #[test]
        fn dup_copies_the_top_n_values_unchanged(values in prop::collection::vec(0u32..1000, 1..8), n in 1usize..4) {
            prop_assume!(n <= values.len());
            let mut s = DualStack::new();
            for &v in &values {
                s.push(Value::Num(v)).unwrap();
            }
            s.dup(n as u16).unwrap();
            let mut copy = Vec::new();
            for _ in 0..n {
                copy.push(s.pop().unwrap().as_num().unwrap());
            }
            copy.reverse();
            let mut original = Vec::new();
            for _ in 0..n {
                original.push(s.pop().unwrap().as_num().unwrap());
            }
            original.reverse();
            prop_assert_eq!(copy, original);
        }
    }
}
