//! Response head handling.
//!
//! Every response produced by the server carries the same three headers, so the
//! head is reduced to the values that vary between responses.

use http::StatusCode;

/// Status line and header values of a response about to be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    content_length: u64,
    keep_alive: bool,
}

impl ResponseHead {
    pub fn new(status: StatusCode, content_length: u64, keep_alive: bool) -> Self {
        Self { status, content_length, keep_alive }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}
