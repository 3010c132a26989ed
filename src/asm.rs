//! A code-generation-time helper for building [`Instruction`] sequences that
//! juggle several named values deep in the argument stack at once.
//!
//! This has no presence in the running VM: it is a small offline assembler
//! used once, by [`crate::validator`], to emit a fixed instruction sequence.
//! It tracks where each named value lives by mirroring the real
//! [`crate::stack::DualStack`] `roll`/`dup` arithmetic against a plain
//! `Vec` of names, so the `ROLL`/`DUP` counts baked into the program are
//! derived mechanically instead of hand-counted.

use crate::instruction::{Instruction, Operand};
use crate::value::Value;

/// A symbolic mirror of the argument stack's shape, bottom to top.
#[derive(Debug, Default, Clone)]
struct Shape {
    slots: Vec<&'static str>,
}

impl Shape {
    /// Distance of the named slot from the top (0 = top). Finds the
    /// most-recently-pushed occurrence, which is what every caller here
    /// means by a name once duplicates exist only transiently.
    fn depth_of(&self, name: &str) -> u16 {
        let pos = self
            .slots
            .iter()
            .rposition(|&n| n == name)
            .unwrap_or_else(|| panic!("asm: no slot named {name:?} on the symbolic stack"));
        (self.slots.len() - 1 - pos) as u16
    }

    fn push(&mut self, name: &'static str) {
        self.slots.push(name);
    }

    fn pop(&mut self) {
        self.slots.pop().expect("asm: symbolic stack underflow");
    }

    fn dup_top(&mut self) {
        let top = *self.slots.last().expect("asm: symbolic stack underflow");
        self.slots.push(top);
    }

    /// Mirrors [`crate::stack::DualStack::roll`]: the top slot moves to the
    /// bottom of the `n`-window, the rest shift up by one.
    fn roll(&mut self, n: u16) {
        let n = n as usize;
        let len = self.slots.len();
        let window = &mut self.slots[len - n..];
        let top = window[n - 1];
        for i in (1..n).rev() {
            window[i] = window[i - 1];
        }
        window[0] = top;
    }
}

/// Builds a straight-line (plus forward-branch) instruction sequence while
/// tracking named argument-stack slots.
#[derive(Debug, Default)]
pub struct Builder {
    shape: Shape,
    out: Vec<Instruction>,
}

/// A not-yet-resolved forward branch: the address of the `JMPIF` whose
/// literal still needs [`Builder::patch_to_here`].
#[derive(Debug, Clone, Copy)]
pub struct PatchPoint(usize);

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `Builder` seeded with the names already on the real stack
    /// at this point — e.g. a subroutine's calling convention — without
    /// emitting any instructions for them.
    pub fn with_initial_shape(names: &[&'static str]) -> Self {
        let mut b = Self::default();
        for &name in names {
            b.shape.push(name);
        }
        b
    }

    pub fn len(&self) -> u16 {
        self.out.len() as u16
    }

    /// Emits an instruction that has no effect on the tracked names
    /// (`ADD`/`SUB`/comparisons consumed via [`Builder::consume`] handle the
    /// stack-effect bookkeeping themselves; this is for everything else,
    /// e.g. `FLUSH`, `CALL`, `JMPIF`).
    pub fn emit(&mut self, instr: Instruction) -> &mut Self {
        self.out.push(instr);
        self
    }

    /// Emits `instr`, which pushes exactly one new value, and names it.
    pub fn push_named(&mut self, name: &'static str, instr: Instruction) -> &mut Self {
        self.out.push(instr);
        self.shape.push(name);
        self
    }

    /// Emits `instr` (e.g. an unnamed literal push used only as an operand
    /// to the very next op) without tracking it by name.
    pub fn push_anon(&mut self, instr: Instruction) -> &mut Self {
        self.out.push(instr);
        self.shape.push("");
        self
    }

    /// Brings the named slot to the absolute top via the minimal number of
    /// `ROLL` applications, leaving every other tracked slot's relative
    /// position among themselves rotated (not restored) — callers only rely
    /// on the symbolic [`Shape`], which stays accurate, never on an assumed
    /// canonical order mid-routine.
    pub fn bring_to_top(&mut self, name: &str) -> &mut Self {
        let d = self.shape.depth_of(name);
        for _ in 0..d {
            self.out.push(Instruction::roll(d + 1));
            self.shape.roll(d + 1);
        }
        self
    }

    /// Brings the named slot to the top and duplicates it, so a transient
    /// copy is available for consumption while the original stays tracked
    /// under the same name (now one slot deeper).
    pub fn peek(&mut self, name: &str) -> &mut Self {
        self.bring_to_top(name);
        self.out.push(Instruction::dup(1));
        self.shape.dup_top();
        self
    }

    /// Drops the top `n` tracked (anonymous or named) slots via `POP`,
    /// matching an instruction that actually pops them.
    pub fn drop_top(&mut self, n: u16) -> &mut Self {
        self.pop_via(n, Instruction::pop(n))
    }

    /// Brings the named slot to the top and discards it entirely — its
    /// last use in this routine.
    pub fn drop_named(&mut self, name: &str) -> &mut Self {
        self.bring_to_top(name);
        self.drop_top(1)
    }

    /// Emits `instr`, which pops `n` tracked slots and pushes nothing
    /// (`OUTPUT`, `FLUSH`, `HALT`, `POP`).
    pub fn pop_via(&mut self, n: u16, instr: Instruction) -> &mut Self {
        self.out.push(instr);
        for _ in 0..n {
            self.shape.pop();
        }
        self
    }

    /// Updates the tracked shape to match a pop that happens *elsewhere* —
    /// a `CALL`'s callee popping its argument, emitted as a separate
    /// instruction stream and later concatenated after this one. Emits
    /// nothing here; the real `POP` already lives in the callee.
    pub fn forget_top(&mut self, n: u16) -> &mut Self {
        for _ in 0..n {
            self.shape.pop();
        }
        self
    }

    /// Records that `instr` pops `consumed` tracked slots and pushes one
    /// new value, which is named `result`. Used after `ADD`/`SUB`/`EQ`/
    /// `LT`/`GT`/`AND`/`OR`/`NOT`, all of which reduce several operands to
    /// one value.
    pub fn consume(&mut self, consumed: u16, result: &'static str, instr: Instruction) -> &mut Self {
        self.out.push(instr);
        for _ in 0..consumed {
            self.shape.pop();
        }
        self.shape.push(result);
        self
    }

    /// Brings `cond_name` to the top and emits a `JMPIF` with a placeholder
    /// literal, consuming the tracked condition (as the real `JMPIF` does
    /// at runtime). Call [`Builder::patch_to_here`] once the skip target is
    /// known.
    pub fn branch_if_forward(&mut self, cond_name: &str) -> PatchPoint {
        self.bring_to_top(cond_name);
        let addr = self.out.len();
        self.out.push(Instruction::jmpif(2));
        self.shape.pop();
        PatchPoint(addr)
    }

    /// An unconditional forward branch: `PUSHB(true)` followed by a
    /// placeholder `JMPIF`. Leaves the tracked shape untouched (the pushed
    /// literal and the jump's pop cancel out).
    pub fn jump_forward(&mut self) -> PatchPoint {
        self.out.push(Instruction::pushb(true));
        let addr = self.out.len();
        self.out.push(Instruction::jmpif(2));
        PatchPoint(addr)
    }

    /// Resolves `patch` to jump to the current end of the instruction
    /// stream.
    pub fn patch_to_here(&mut self, patch: PatchPoint) {
        let target = self.out.len() as u16;
        let addr = patch.0 as u16;
        let lit = target.checked_sub(addr).expect("asm: patch target precedes its JMPIF");
        assert!(lit >= 2, "asm: forward jump must skip at least one instruction, got lit={lit}");
        self.out[patch.0].operand = Operand::Literal(Value::Pc(lit));
    }

    /// Reorders the tracked slots named in `desired` (bottom to top) to
    /// exactly that order, via repeated bring-to-top-then-roll-to-bottom
    /// (a selection sort using only `ROLL`). `desired` must name exactly
    /// the slots currently tracked, once each.
    pub fn reorder_to(&mut self, desired: &[&'static str]) -> &mut Self {
        let total = desired.len();
        for (placed, &name) in desired.iter().enumerate() {
            let remaining = (total - placed) as u16;
            self.bring_to_top(name);
            if remaining > 1 {
                self.out.push(Instruction::roll(remaining));
                self.shape.roll(remaining);
            }
        }
        self
    }

    /// The instruction sequence's current length, i.e. the offset just past
    /// the last emitted instruction. Combined with [`Builder::len`] at an
    /// earlier point, gives a `JMPIF`/`CALL` target.
    pub fn finish(self) -> Vec<Instruction> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bring_to_top_emits_depth_many_rolls_of_the_same_window() {
        let mut b = Builder::new();
        b.push_named("a", Instruction::pushn(1));
        b.push_named("b", Instruction::pushn(2));
        b.push_named("c", Instruction::pushn(3));
        b.bring_to_top("a");
        let out = b.finish();
        // "a" starts at depth 2, so it takes two ROLL(3) applications (each
        // moves the window's top to its bottom) to surface it.
        assert_eq!(out.len(), 5);
        assert_eq!(out[3], Instruction::roll(3));
        assert_eq!(out[4], Instruction::roll(3));
    }

    #[test]
    fn bring_to_top_of_the_current_top_emits_nothing() {
        let mut b = Builder::new();
        b.push_named("a", Instruction::pushn(1));
        b.bring_to_top("a");
        assert_eq!(b.finish().len(), 1);
    }

    #[test]
    fn peek_duplicates_without_losing_the_original_name() {
        let mut b = Builder::new();
        b.push_named("a", Instruction::pushn(1));
        b.peek("a");
        // still tracked afterward: bring_to_top("a") finds it without panicking.
        b.bring_to_top("a");
        let out = b.finish();
        assert_eq!(out[1], Instruction::dup(1));
    }

    #[test]
    fn reorder_to_leaves_shape_in_the_requested_order() {
        let mut b = Builder::new();
        b.push_named("a", Instruction::pushn(1));
        b.push_named("b", Instruction::pushn(2));
        b.push_named("c", Instruction::pushn(3));
        b.reorder_to(&["c", "a", "b"]);
        // Whatever the emitted ROLLs were, the tracked shape now resolves
        // "b" at the top with zero further ROLLs needed.
        b.bring_to_top("b");
        let before = b.len();
        b.bring_to_top("b");
        assert_eq!(b.len(), before, "b was already on top, so this should be a no-op");
    }

    #[test]
    #[should_panic(expected = "no slot named")]
    fn depth_of_unknown_name_panics() {
        let mut b = Builder::new();
        b.push_named("a", Instruction::pushn(1));
        b.bring_to_top("nonexistent");
    }

    #[test]
    #[should_panic(expected = "skip at least one instruction")]
    fn patch_to_here_rejects_a_zero_gap_jump() {
        let mut b = Builder::new();
        b.push_named("cond", Instruction::pushb(true));
        let patch = b.branch_if_forward("cond");
        b.patch_to_here(patch);
    }

    #[test]
    fn forget_top_removes_the_tracked_slot_without_emitting() {
        let mut b = Builder::new();
        b.push_named("a", Instruction::pushn(1));
        b.push_named("k", Instruction::pushn(2));
        let before = b.len();
        b.forget_top(1);
        assert_eq!(b.len(), before, "forget_top must not emit an instruction");
        // "k" is gone; only "a" remains tracked.
        b.bring_to_top("a");
    }

    #[test]
    fn with_initial_shape_tracks_preexisting_names() {
        let mut b = Builder::with_initial_shape(&["x", "y"]);
        assert_eq!(b.len(), 0);
        b.bring_to_top("x");
        assert_eq!(b.finish(), vec![Instruction::roll(2)]);
    }
}
