//! Splits the modem's byte stream into lines.
//!
//! Both `\r` and `\n` end a line and empty lines are skipped, so `\r\n`,
//! bare `\n` and the blank line the modem prints before most responses all
//! come out the same way.

use heapless::{String, Vec};

/// Longest line the reader keeps. Longer lines are dropped whole.
pub const MAX_LINE_LEN: usize = 128;

/// One received line, without its terminator.
pub type Line = String<MAX_LINE_LEN>;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Incremental line splitter.
#[derive(Debug, Default)]
pub struct LineReader {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineReader {
    /// Creates an empty reader.
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Feeds one byte and returns the line it completes, if any.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        if byte == CR || byte == LF {
            return self.finish();
        }
        if self.overflowed {
            return None;
        }
        if self.buffer.push(byte).is_err() {
            warn!("line longer than {=usize} bytes dropped", MAX_LINE_LEN);
            self.buffer.clear();
            self.overflowed = true;
        }
        None
    }

    /// Number of bytes buffered for the current partial line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn finish(&mut self) -> Option<Line> {
        if self.overflowed {
            self.overflowed = false;
            return None;
        }
        if self.buffer.is_empty() {
            return None;
        }

        let bytes = core::mem::take(&mut self.buffer);
        match String::from_utf8(bytes) {
            Ok(line) => Some(line),
            Err(_) => {
                warn!("non UTF-8 line dropped");
                None
            }
        }
    }
}
