//! The output queue: a fixed-capacity line buffer built up by typed
//! appends and delivered to the host in one piece by `flush` (§3, §4.4).

use crate::error::GruntError;
use crate::program::StringTable;
use crate::value::Severity;

/// Capacity of the output line, in bytes, including the reserved NUL.
///
/// The reference implementation sizes this to the host event reporter's own
/// per-event maximum (`CFE_MISSION_EVS_MAX_MESSAGE_LENGTH`); a standalone
/// crate has no such constant to borrow, so this picks a generous, still
/// fixed, stand-in.
pub const CAPACITY: usize = 256;

/// A function that delivers one finished line to the host.
///
/// `line` is the accumulated payload, NUL-terminated, never longer than
/// [`CAPACITY`].
pub trait EventSink {
    /// Delivers one event: the opaque `event_id`, an opaque `severity`, and
    /// the rendered, NUL-terminated line.
    fn emit(&mut self, event_id: u32, severity: Severity, line: &[u8]);
}

/// An [`EventSink`] backed by a plain closure.
impl<F: FnMut(u32, Severity, &[u8])> EventSink for F {
    fn emit(&mut self, event_id: u32, severity: Severity, line: &[u8]) {
        (self)(event_id, severity, line)
    }
}

/// The line under construction.
///
/// Invariant: `buffer[0..tail]` holds the accumulated payload and
/// `buffer[tail..]` is all zero.
pub struct OutputQueue {
    buffer: [u8; CAPACITY],
    tail: usize,
}

impl OutputQueue {
    /// A freshly reset queue.
    pub fn new() -> Self {
        Self { buffer: [0u8; CAPACITY], tail: 0 }
    }

    /// The number of payload bytes currently accumulated.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Zeroes the entire buffer and resets `tail` to 0.
    pub fn reset(&mut self) {
        self.buffer = [0u8; CAPACITY];
        self.tail = 0;
    }

    fn enqueue(&mut self, bytes: &[u8]) -> Result<(), GruntError> {
        if self.tail + bytes.len() > CAPACITY - 1 {
            return Err(GruntError::out_of_bounds(
                "output_enqueue",
                format!(
                    "appending {} bytes at tail {} would exceed the line capacity of {CAPACITY}",
                    bytes.len(),
                    self.tail
                ),
            ));
        }
        self.buffer[self.tail..self.tail + bytes.len()].copy_from_slice(bytes);
        self.tail += bytes.len();
        Ok(())
    }

    /// Appends the literal word `true` or `false`.
    pub fn append_bool(&mut self, b: bool) -> Result<(), GruntError> {
        self.enqueue(if b { b"true" } else { b"false" })
    }

    /// Appends the decimal, unsigned, zero-pad-free representation of `u`.
    pub fn append_number(&mut self, u: u32) -> Result<(), GruntError> {
        let mut buf = [0u8; 10];
        let rendered = write_decimal(u, &mut buf);
        self.enqueue(rendered)
    }

    /// Appends the `i`-th constant string, not including its terminator.
    pub fn append_string(&mut self, i: u16, strings: &StringTable<'_>) -> Result<(), GruntError> {
        let s = strings.get(i).ok_or_else(|| {
            GruntError::invalid_literal(
                "append_string",
                format!("string index {i} is out of range for a table of {} strings", strings.len()),
            )
        })?;
        self.enqueue(s.as_bytes())
    }

    /// Delivers the accumulated line (NUL-terminated) to `sink`, then resets.
    pub fn flush(&mut self, event_id: u32, severity: Severity, sink: &mut impl EventSink) {
        // `buffer[tail]` is always 0 by the reset/enqueue invariant, so
        // `buffer[..=tail]` is already NUL-terminated.
        sink.emit(event_id, severity, &self.buffer[..=self.tail]);
        self.reset();
    }
}

impl Default for OutputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders `u` as decimal digits into `buf` (10 bytes, enough for any
/// `u32`), returning the written slice.
/// No sign, no leading zeros (except for the value `0` itself), no padding.
fn write_decimal(u: u32, buf: &mut [u8; 10]) -> &[u8] {
    if u == 0 {
        buf[0] = b'0';
        return &buf[..1];
    }
    let mut n = u;
    let mut i = buf.len();
    while n > 0 {
        i -= 1;
        buf[i] = b'0' + (n % 10) as u8;
        n /= 10;
    }
    &buf[i..]
}
