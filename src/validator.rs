//! The four-entry table image validator (§4.7): a concrete Grunt program,
//! hand-assembled with [`crate::asm::Builder`], plus the constant string
//! table it renders its messages from.
//!
//! The program treats the image as four consecutive 12-byte records —
//! `{ parm_id: u8, pad: [u8; 3], bound_low: u32, bound_high: u32 }` — and
//! calls one shared subroutine once per entry, threading running state
//! through the argument stack across the four `CALL`s.

use crate::asm::Builder;
use crate::instruction::Instruction;
use crate::program::Program;
use crate::value::severity;

/// One table entry's on-image footprint: `parm_id`(1) + `pad`(3) +
/// `bound_low`(4) + `bound_high`(4).
pub const RECORD_LEN: usize = 12;

/// Number of entries in a table image.
pub const NUM_ENTRIES: usize = 4;

/// Total image size in bytes.
pub const IMAGE_LEN: usize = RECORD_LEN * NUM_ENTRIES;

/// Parameter identifier bytes and the bound ranges each in-use class must
/// satisfy.
pub mod table {
    pub const PARM_UNUSED: u32 = 0x00;
    pub const PARM_APE: u32 = 0x01;
    pub const PARM_BAT: u32 = 0x02;
    pub const PARM_CAT: u32 = 0x04;
    pub const PARM_DOG: u32 = 0x08;
    pub const PARM_NORTH: u32 = 0x10;
    pub const PARM_SOUTH: u32 = 0x20;
    pub const PARM_EAST: u32 = 0x40;
    pub const PARM_WEST: u32 = 0x80;

    pub const ANIMAL_MIN: u32 = 0x0000_0010;
    pub const ANIMAL_MAX: u32 = 0x0000_1000;
    pub const DIRECTION_MIN: u32 = 0x0001_0000;
    pub const DIRECTION_MAX: u32 = 0x0100_0000;
}

/// Event identifiers emitted by the validator program (§4.7). The VM
/// carries these as opaque numbers; the host assigns their meaning.
pub mod event {
    pub const VALIDATION_INFO: u32 = 0x0008;
    pub const ZERO: u32 = 0x2001;
    pub const PARM: u32 = 0x2002;
    pub const PAD: u32 = 0x2004;
    pub const LBND: u32 = 0x2008;
    pub const HBND: u32 = 0x2010;
    pub const ORDER: u32 = 0x2020;
    pub const EXTRA: u32 = 0x2040;
    pub const REDEF: u32 = 0x2080;
}

/// Indices into [`STRINGS`].
mod str_idx {
    pub const ENTRIES_PREFIX: u16 = 0;
    pub const VALID_SUFFIX: u16 = 1;
    pub const INVALID_SUFFIX: u16 = 2;
    pub const UNUSED_SUFFIX: u16 = 3;
    pub const TABLE_ENTRY: u16 = 4;
    pub const PARM: u16 = 5;
    pub const NOT_ZEROED: u16 = 6;
    pub const INVALID_PARM_ID: u16 = 7;
    pub const PADDING_NOT_ZEROED: u16 = 8;
    pub const INVALID_LOW_BOUND: u16 = 9;
    pub const INVALID_HIGH_BOUND: u16 = 10;
    pub const INVALID_BOUND_ORDER: u16 = 11;
    pub const FOLLOWS_UNUSED: u16 = 12;
    pub const REDEFINES: u16 = 13;
    pub const NAME_UNUSED: u16 = 14;
    pub const NAME_APE: u16 = 15;
    pub const NAME_BAT: u16 = 16;
    pub const NAME_CAT: u16 = 17;
    pub const NAME_DOG: u16 = 18;
    pub const NAME_NORTH: u16 = 19;
    pub const NAME_SOUTH: u16 = 20;
    pub const NAME_EAST: u16 = 21;
    pub const NAME_WEST: u16 = 22;
    pub const NAME_UNKNOWN: u16 = 23;
}

/// The constant string table required by §6, in index order.
pub const STRINGS: [&str; 24] = [
    "Table image entries: ",
    " valid, ",
    " invalid, ",
    " unused",
    "Table entry ",
    " parm ",
    " not zeroed",
    " invalid Parm ID",
    " padding not zeroed",
    " invalid low bound",
    " invalid high bound",
    " invalid bound order",
    " follows an unused entry",
    " redefines earlier entry",
    "Unused",
    "Ape",
    "Bat",
    "Cat",
    "Dog",
    "North",
    "South",
    "East",
    "West",
    "Unknown",
];

/// The persistent calling convention threaded through the four `CALL`s,
/// bottom to top. `k` (the 1-based entry index) is pushed fresh before
/// each call and consumed by the subroutine; everything else survives a
/// call unchanged in identity, possibly updated in value.
const PERSISTENT: [&str; 10] = [
    "unused", "valid", "seen_ape", "seen_bat", "seen_cat", "seen_dog", "seen_north", "seen_south", "seen_east",
    "seen_west",
];

struct Animal {
    value: u32,
    name_idx: u16,
    seen: &'static str,
}

const ANIMALS: [Animal; 8] = [
    Animal { value: table::PARM_APE, name_idx: str_idx::NAME_APE, seen: "seen_ape" },
    Animal { value: table::PARM_BAT, name_idx: str_idx::NAME_BAT, seen: "seen_bat" },
    Animal { value: table::PARM_CAT, name_idx: str_idx::NAME_CAT, seen: "seen_cat" },
    Animal { value: table::PARM_DOG, name_idx: str_idx::NAME_DOG, seen: "seen_dog" },
    Animal { value: table::PARM_NORTH, name_idx: str_idx::NAME_NORTH, seen: "seen_north" },
    Animal { value: table::PARM_SOUTH, name_idx: str_idx::NAME_SOUTH, seen: "seen_south" },
    Animal { value: table::PARM_EAST, name_idx: str_idx::NAME_EAST, seen: "seen_east" },
    Animal { value: table::PARM_WEST, name_idx: str_idx::NAME_WEST, seen: "seen_west" },
];

fn bounds_for(value: u32) -> (u32, u32) {
    if value < table::PARM_NORTH {
        (table::ANIMAL_MIN, table::ANIMAL_MAX)
    } else {
        (table::DIRECTION_MIN, table::DIRECTION_MAX)
    }
}

/// `"Table entry " K " parm " <name> <suffix>`, then `FLUSH(ERROR, event_id)`.
fn emit_named_message(b: &mut Builder, name_idx: u16, suffix_idx: u16, event_id: u32) {
    b.push_anon(Instruction::pushs(str_idx::TABLE_ENTRY));
    b.pop_via(1, Instruction::output());
    b.peek("k");
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::PARM));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(name_idx));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(suffix_idx));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushn(severity::ERROR));
    b.push_anon(Instruction::pushn(event_id));
    b.pop_via(2, Instruction::flush());
}

/// Brings `ok_name` to a transient copy, emits the message iff it's false,
/// and leaves the original tracked under the same name for later reuse.
fn emit_error_if_false(b: &mut Builder, ok_name: &'static str, event_id: u32, name_idx: u16, suffix_idx: u16) {
    b.peek(ok_name);
    let skip = b.branch_if_forward(ok_name);
    emit_named_message(b, name_idx, suffix_idx, event_id);
    b.patch_to_here(skip);
}

/// Finishes a case body: drops `parm_id` and `k`, restores [`PERSISTENT`]
/// order, and jumps to the shared subroutine epilogue.
fn finish_case(b: &mut Builder) -> crate::asm::PatchPoint {
    b.drop_named("parm_id");
    b.drop_named("k");
    b.reorder_to(&PERSISTENT);
    b.jump_forward()
}

fn emit_unused_case(b: &mut Builder) -> crate::asm::PatchPoint {
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(4));
    b.push_anon(Instruction::input(4));
    b.push_anon(Instruction::pushn(0));
    b.consume(6, "zero_ok", Instruction::eq(6));

    b.peek("zero_ok");
    let skip_emit = b.branch_if_forward("zero_ok");
    b.push_anon(Instruction::pushs(str_idx::TABLE_ENTRY));
    b.pop_via(1, Instruction::output());
    b.peek("k");
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::PARM));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::NAME_UNUSED));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::NOT_ZEROED));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushn(severity::ERROR));
    b.push_anon(Instruction::pushn(event::ZERO));
    b.pop_via(2, Instruction::flush());
    b.patch_to_here(skip_emit);

    // A conditional counter bump must leave the *same* tracked shape on
    // both paths, since whichever JMPIF fires, the other leg's code never
    // runs: compute `_unused_inc` (0 or 1) via symmetric if/else legs, then
    // fold it in unconditionally.
    b.bring_to_top("zero_ok");
    b.consume(1, "not_zero_ok", Instruction::not());
    let to_else = b.branch_if_forward("not_zero_ok");
    b.push_named("_unused_inc", Instruction::pushn(1));
    let to_end = b.jump_forward();
    b.patch_to_here(to_else);
    b.push_named("_unused_inc", Instruction::pushn(0));
    b.patch_to_here(to_end);
    b.bring_to_top("unused");
    b.bring_to_top("_unused_inc");
    b.consume(2, "unused", Instruction::add());

    finish_case(b)
}

fn emit_inuse_case(b: &mut Builder, animal: &Animal) -> crate::asm::PatchPoint {
    let (min, max) = bounds_for(animal.value);
    let name_idx = animal.name_idx;

    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::pushn(0));
    b.consume(4, "pad_ok", Instruction::eq(4));
    emit_error_if_false(b, "pad_ok", event::PAD, name_idx, str_idx::PADDING_NOT_ZEROED);

    b.push_named("low", Instruction::input(4));
    b.push_named("high", Instruction::input(4));

    b.peek("low");
    b.push_anon(Instruction::pushn(min));
    b.consume(2, "_t", Instruction::lt());
    b.consume(1, "_not_lt", Instruction::not());
    b.peek("low");
    b.push_anon(Instruction::pushn(max));
    b.consume(2, "_t", Instruction::gt());
    b.consume(1, "_not_gt", Instruction::not());
    b.consume(2, "lbnd_ok", Instruction::and(2));
    emit_error_if_false(b, "lbnd_ok", event::LBND, name_idx, str_idx::INVALID_LOW_BOUND);

    b.peek("high");
    b.push_anon(Instruction::pushn(min));
    b.consume(2, "_t", Instruction::lt());
    b.consume(1, "_not_lt", Instruction::not());
    b.peek("high");
    b.push_anon(Instruction::pushn(max));
    b.consume(2, "_t", Instruction::gt());
    b.consume(1, "_not_gt", Instruction::not());
    b.consume(2, "hbnd_ok", Instruction::and(2));
    emit_error_if_false(b, "hbnd_ok", event::HBND, name_idx, str_idx::INVALID_HIGH_BOUND);

    b.bring_to_top("low");
    b.bring_to_top("high");
    b.consume(2, "_order_bad", Instruction::gt());
    b.consume(1, "order_ok", Instruction::not());
    emit_error_if_false(b, "order_ok", event::ORDER, name_idx, str_idx::INVALID_BOUND_ORDER);

    b.peek("unused");
    b.push_anon(Instruction::pushn(0));
    b.consume(2, "_extra_bad", Instruction::gt());
    b.consume(1, "extra_ok", Instruction::not());
    emit_error_if_false(b, "extra_ok", event::EXTRA, name_idx, str_idx::FOLLOWS_UNUSED);

    b.peek(animal.seen);
    b.consume(1, "redef_ok", Instruction::not());
    emit_error_if_false(b, "redef_ok", event::REDEF, name_idx, str_idx::REDEFINES);

    b.bring_to_top("pad_ok");
    b.bring_to_top("lbnd_ok");
    b.bring_to_top("hbnd_ok");
    b.bring_to_top("order_ok");
    b.bring_to_top("extra_ok");
    b.bring_to_top("redef_ok");
    b.consume(6, "entry_valid", Instruction::and(6));

    // `seen` only ever grows, so it folds in straight-line with OR, no
    // branch needed: seen' = seen || entry_valid.
    b.peek("entry_valid");
    b.bring_to_top(animal.seen);
    b.consume(2, animal.seen, Instruction::or());

    // The valid counter's bump is conditional, so (as in the unused-entry
    // case) both legs must leave an identically-shaped `_valid_inc` slot.
    b.peek("entry_valid");
    b.consume(1, "not_valid", Instruction::not());
    let to_else = b.branch_if_forward("not_valid");
    b.push_named("_valid_inc", Instruction::pushn(1));
    let to_end = b.jump_forward();
    b.patch_to_here(to_else);
    b.push_named("_valid_inc", Instruction::pushn(0));
    b.patch_to_here(to_end);
    b.bring_to_top("valid");
    b.bring_to_top("_valid_inc");
    b.consume(2, "valid", Instruction::add());

    b.drop_named("entry_valid");
    finish_case(b)
}

fn emit_parm_invalid_case(b: &mut Builder) -> crate::asm::PatchPoint {
    b.push_anon(Instruction::pushs(str_idx::TABLE_ENTRY));
    b.pop_via(1, Instruction::output());
    b.peek("k");
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::INVALID_PARM_ID));
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushn(severity::ERROR));
    b.push_anon(Instruction::pushn(event::PARM));
    b.pop_via(2, Instruction::flush());

    // Every case must consume exactly RECORD_LEN bytes of the entry
    // regardless of which one handles it, or the next CALL's reads start
    // mid-record: drain the remaining pad/bound fields unread here.
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(1));
    b.push_anon(Instruction::input(4));
    b.push_anon(Instruction::input(4));
    b.drop_top(5);

    finish_case(b)
}

/// Emits the shared per-entry subroutine: dispatch on the identifier byte,
/// then one of the nine case bodies, converging on a single `RETURN`.
fn emit_subroutine(b: &mut Builder) {
    b.push_named("parm_id", Instruction::input(1));

    let mut checks = Vec::with_capacity(1 + ANIMALS.len());
    b.peek("parm_id");
    b.push_anon(Instruction::pushn(table::PARM_UNUSED));
    b.consume(2, "_iseq", Instruction::eq(2));
    checks.push(b.branch_if_forward("_iseq"));
    for animal in &ANIMALS {
        b.peek("parm_id");
        b.push_anon(Instruction::pushn(animal.value));
        b.consume(2, "_iseq", Instruction::eq(2));
        checks.push(b.branch_if_forward("_iseq"));
    }

    let mut ends = Vec::with_capacity(2 + ANIMALS.len());
    ends.push(emit_parm_invalid_case(b));

    b.patch_to_here(checks[0]);
    ends.push(emit_unused_case(b));
    for (i, animal) in ANIMALS.iter().enumerate() {
        b.patch_to_here(checks[i + 1]);
        ends.push(emit_inuse_case(b, animal));
    }

    // Whichever case is emitted last has no case body after it to jump
    // over, so its own `jump_forward` would land with a zero-instruction
    // gap. A harmless shape-neutral filler guarantees every jump skips at
    // least one instruction, regardless of emission order above.
    b.push_anon(Instruction::pushb(true));
    b.drop_top(1);

    for end in ends {
        b.patch_to_here(end);
    }
    b.emit(Instruction::ret());
}

/// Builds the full validator program: the main loop (four `CALL`s plus the
/// closing info line and `HALT`), followed by the shared subroutine.
///
/// The subroutine is assembled in its own [`Builder`], seeded with its own
/// calling-convention shape (the ten persistent names plus `k`), rather
/// than as a continuation of the main sequence's shape — it is invoked
/// from four call sites, each leaving the main sequence's tracked shape
/// exactly as it found it (`k` pushed, then [`Builder::forget_top`] once
/// the callee has, elsewhere, popped it).
pub fn build_program() -> Program {
    let mut b = Builder::new();

    b.push_named("unused", Instruction::pushn(0));
    b.push_named("valid", Instruction::pushn(0));
    for &seen in &PERSISTENT[2..] {
        b.push_named(seen, Instruction::pushb(false));
    }

    let mut call_patches = Vec::with_capacity(NUM_ENTRIES);
    for k in 1..=NUM_ENTRIES as u32 {
        b.push_anon(Instruction::pushn(k));
        let addr = b.len();
        b.emit(Instruction::call(0));
        b.forget_top(1);
        call_patches.push(addr);
    }

    b.push_anon(Instruction::pushs(str_idx::ENTRIES_PREFIX));
    b.pop_via(1, Instruction::output());
    b.peek("valid");
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::VALID_SUFFIX));
    b.pop_via(1, Instruction::output());

    b.push_anon(Instruction::pushn(NUM_ENTRIES as u32));
    b.peek("valid");
    b.consume(2, "_t", Instruction::sub());
    b.peek("unused");
    b.consume(2, "invalid", Instruction::sub());
    b.peek("invalid");
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::INVALID_SUFFIX));
    b.pop_via(1, Instruction::output());

    b.peek("unused");
    b.pop_via(1, Instruction::output());
    b.push_anon(Instruction::pushs(str_idx::UNUSED_SUFFIX));
    b.pop_via(1, Instruction::output());

    b.push_anon(Instruction::pushn(severity::INFORMATION));
    b.push_anon(Instruction::pushn(event::VALIDATION_INFO));
    b.pop_via(2, Instruction::flush());

    b.bring_to_top("invalid");
    b.push_anon(Instruction::pushn(0));
    b.consume(2, "halt_bool", Instruction::eq(2));
    b.pop_via(1, Instruction::halt());

    let mut instructions = b.finish();
    let sub_addr = instructions.len() as u16;

    let mut sub_shape = PERSISTENT.to_vec();
    sub_shape.push("k");
    let mut sub = Builder::with_initial_shape(&sub_shape);
    emit_subroutine(&mut sub);

    for addr in call_patches {
        instructions[addr as usize] = Instruction::call(sub_addr);
    }
    instructions.extend(sub.finish());
    Program::new(instructions)
}
