/// Represents the size information of a request payload.
///
/// Only length-delimited bodies are understood; a request without a
/// `Content-Length` header (or with a zero length) has an empty payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Empty payload (no body)
    #[default]
    Empty,
}

impl PayloadSize {
    /// Creates a payload size from a declared `Content-Length`, treating zero as empty
    #[inline]
    pub fn new_length(length: u64) -> Self {
        if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) }
    }

    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// Number of body bytes the request carries
    #[inline]
    pub fn len(&self) -> u64 {
        match self {
            PayloadSize::Length(n) => *n,
            PayloadSize::Empty => 0,
        }
    }
}
