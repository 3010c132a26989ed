//! The input window: a read-only, dequeue-only view over a caller-supplied
//! byte buffer (§3, §4.3).

use crate::error::GruntError;
use crate::value::Value;

/// A cursor over an externally owned byte buffer.
///
/// The buffer is never copied and never mutated; the VM only ever advances
/// or rewinds `head`. Unlike the output queue this is dequeue-only: Grunt
/// programs read fields out of a table image but never build one.
pub struct InputWindow<'b> {
    buffer: &'b [u8],
    head: usize,
}

impl<'b> InputWindow<'b> {
    /// Opens a window over `buffer`, with the cursor at the start.
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, head: 0 }
    }

    /// The current cursor position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// The buffer's total length, `L`.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Reads `n` consecutive bytes at `head` as a native-endian unsigned
    /// integer and advances `head` by `n`. `n` must be one of `{1, 2, 4}`.
    ///
    /// Native-endian reads are load-bearing: the validator program compares
    /// fields to other fields it reads the same way, never to an
    /// endianness-independent constant derived outside this window, so a
    /// byte-for-byte copy of an in-memory table image produces the same
    /// verdict as the source regardless of host byte order.
    pub fn dequeue(&mut self, n: u16) -> Result<Value, GruntError> {
        let n = match n {
            1 | 2 | 4 => n as usize,
            other => {
                return Err(GruntError::invalid_literal(
                    "INPUT",
                    format!("read width must be 1, 2, or 4 bytes, got {other}"),
                ))
            }
        };

        if self.head + n > self.buffer.len() {
            return Err(GruntError::out_of_bounds(
                "input_dequeue",
                format!(
                    "read of {n} bytes at head {} exceeds buffer length {}",
                    self.head,
                    self.buffer.len()
                ),
            ));
        }

        let slice = &self.buffer[self.head..self.head + n];
        let value = match n {
            1 => slice[0] as u32,
            2 => u16::from_ne_bytes([slice[0], slice[1]]) as u32,
            4 => u32::from_ne_bytes([slice[0], slice[1], slice[2], slice[3]]),
            _ => unreachable!("n was validated above"),
        };
        self.head += n;
        Ok(Value::Num(value))
    }

    /// Moves `head` back by `n` bytes, or to the start if `n == 0`.
    pub fn rewind(&mut self, n: u16) -> Result<(), GruntError> {
        let n = n as usize;
        if n == 0 {
            self.head = 0;
            return Ok(());
        }
        if n > self.head {
            return Err(GruntError::out_of_bounds(
                "input_rewind",
                format!("cannot rewind {n} bytes, head is only at {}", self.head),
            ));
        }
        self.head -= n;
        Ok(())
    }
}
