//! Decoder for request bodies delimited by a Content-Length header.
//!
//! The body is never interpreted. The decoder only reports once the declared
//! number of bytes following the header section has been received.

use std::ops::Range;

/// Tracks a body of known length starting at a fixed offset of the read buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// Offset of the first body byte, right after the blank line
    body_start: usize,
    /// The declared content length
    length: u64,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder instance.
    ///
    /// # Arguments
    /// * `body_start` - Offset where the header section ended
    /// * `length` - The total content length, specified by Content-Length header
    pub fn new(body_start: usize, length: u64) -> Self {
        Self { body_start, length }
    }

    /// Returns the body range once `src` holds the whole body, `None` while more bytes are needed.
    pub fn decode(&self, src: &[u8]) -> Option<Range<usize>> {
        let received = src.len().saturating_sub(self.body_start) as u64;
        if received < self.length {
            return None;
        }

        // received >= length, so the body fits inside src
        let end = self.body_start + self.length as usize;
        Some(self.body_start..end)
    }
}
