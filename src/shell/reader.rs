//! Line reader for terminal input.
//!
//! Splits the raw byte stream into lines. The byte handling is a pure state
//! machine ([`LineReader::feed`]); [`LineReader::read_line`] drives it from the
//! terminal input queue and performs the echo.
//!
//! `\r` and `\n` both end a line, and a `\n` right after `\r` is swallowed so
//! CRLF terminals do not produce an extra blank line. A line that does not fit
//! is discarded up to the next terminator and reported once.

use crate::config::LINE_CAPACITY;
use crate::error::CliError;
use crate::io::Terminal;

/// Outcome of feeding one input byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feed {
    /// Nothing to report (byte ignored, swallowed or discarded)
    Pending,

    /// Byte stored; echo it
    Stored(u8),

    /// Last character removed; erase it on screen
    Erased,

    /// Line complete, buffer holds it
    Line,

    /// Line ended after overflowing; its content is gone
    Overflow,
}

/// Fixed-size line buffer plus terminator state.
#[derive(Debug, Default)]
pub struct LineReader {
    buffer: heapless::Vec<u8, LINE_CAPACITY>,
    skip_lf: bool,
    discarding: bool,
}

impl LineReader {
    /// Create an empty reader.
    pub const fn new() -> Self {
        Self {
            buffer: heapless::Vec::new(),
            skip_lf: false,
            discarding: false,
        }
    }

    /// Process one byte. At most `max_len - 1` bytes are stored per line.
    pub fn feed(&mut self, byte: u8, max_len: usize) -> Feed {
        let after_cr = core::mem::replace(&mut self.skip_lf, false);

        match byte {
            b'\n' if after_cr => Feed::Pending,

            b'\r' | b'\n' => {
                self.skip_lf = byte == b'\r';
                if core::mem::replace(&mut self.discarding, false) {
                    Feed::Overflow
                } else {
                    Feed::Line
                }
            }

            _ if self.discarding => Feed::Pending,

            0x08 | 0x7f => {
                if self.erase_char() {
                    Feed::Erased
                } else {
                    Feed::Pending
                }
            }

            b'\t' => self.store(byte, max_len),

            // Remaining control characters (escape sequences included) are dropped.
            _ if byte < 0x20 => Feed::Pending,

            _ => self.store(byte, max_len),
        }
    }

    /// Bytes of the line collected so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Forget any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Read one line from `terminal`.
    ///
    /// Returns the line without its terminator. Overlong lines are consumed up
    /// to their terminator and reported as `LineTooLong`.
    pub async fn read_line(
        &mut self,
        terminal: &Terminal,
        max_len: usize,
        echo: bool,
    ) -> Result<&str, CliError> {
        let max_len = max_len.clamp(1, LINE_CAPACITY);
        self.clear();

        loop {
            let byte = terminal.get().await;
            match self.feed(byte, max_len) {
                Feed::Pending => {}
                Feed::Stored(byte) => {
                    if echo {
                        terminal.put(byte).await;
                    }
                }
                Feed::Erased => {
                    if echo {
                        terminal.write_str("\x08 \x08").await;
                    }
                }
                Feed::Line => {
                    if echo {
                        terminal.write_str("\r\n").await;
                    }
                    return core::str::from_utf8(&self.buffer).map_err(|_| CliError::InvalidInput);
                }
                Feed::Overflow => {
                    if echo {
                        terminal.write_str("\r\n").await;
                    }
                    return Err(CliError::LineTooLong { max: max_len });
                }
            }
        }
    }

    fn store(&mut self, byte: u8, max_len: usize) -> Feed {
        let limit = max_len.clamp(1, LINE_CAPACITY) - 1;
        if self.buffer.len() >= limit || self.buffer.push(byte).is_err() {
            warn!("input line exceeds {} bytes, discarding", limit);
            self.buffer.clear();
            self.discarding = true;
            return Feed::Pending;
        }
        Feed::Stored(byte)
    }

    /// Remove the last character, including all bytes of a multi-byte sequence.
    fn erase_char(&mut self) -> bool {
        let mut erased = false;
        while let Some(byte) = self.buffer.pop() {
            erased = true;
            if byte & 0xc0 != 0x80 {
                break;
            }
        }
        erased
    }
}
