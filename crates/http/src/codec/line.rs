//! Incremental line extraction over the connection's read buffer.
//!
//! The scanner remembers how far it has looked (`checked_index`) and where the
//! line currently being assembled begins (`start_line`), so a line split over
//! several socket reads is resumed rather than rescanned from the start.

use std::ops::Range;

/// Result of looking for the next line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    /// A full line, terminator excluded.
    Complete(Range<usize>),
    /// No terminator yet, more bytes are needed.
    Open,
    /// A `\r` or `\n` in a position no valid line allows.
    Bad { offset: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineScanner {
    checked_index: usize,
    start_line: usize,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes already consumed by the scanner.
    #[inline]
    pub fn checked_index(&self) -> usize {
        self.checked_index
    }

    /// Offset of the first byte of the line being assembled.
    #[inline]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn reset(&mut self) {
        self.checked_index = 0;
        self.start_line = 0;
    }

    /// Scans `src` (the filled part of the read buffer) for the next line.
    ///
    /// Only `\r\n` terminates a line. A `\r` as the last available byte leaves
    /// the scanner parked on it until the next byte arrives.
    pub fn next_line(&mut self, src: &[u8]) -> LineStatus {
        while self.checked_index < src.len() {
            let index = self.checked_index;
            match src[index] {
                b'\r' => {
                    if index + 1 == src.len() {
                        return LineStatus::Open;
                    }
                    if src[index + 1] == b'\n' {
                        self.checked_index = index + 2;
                        return self.complete(index);
                    }
                    return LineStatus::Bad { offset: index };
                }
                b'\n' => {
                    if index > self.start_line && src[index - 1] == b'\r' {
                        self.checked_index = index + 1;
                        return self.complete(index - 1);
                    }
                    return LineStatus::Bad { offset: index };
                }
                _ => self.checked_index += 1,
            }
        }

        LineStatus::Open
    }

    fn complete(&mut self, end: usize) -> LineStatus {
        let line = self.start_line..end;
        self.start_line = self.checked_index;
        LineStatus::Complete(line)
    }
}
