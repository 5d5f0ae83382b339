//! HTTP request decoder module
//!
//! This module drives request parsing over the bytes accumulated in a
//! connection's read buffer. Parsing is resumable: every call picks up where
//! the previous one stopped, so the result does not depend on how the request
//! was split across socket reads.
//!
//! # Example
//!
//! ```
//! use micro_static::codec::RequestDecoder;
//!
//! let mut decoder = RequestDecoder::new();
//! assert!(decoder.decode(b"GET /index.html HTTP/1.1\r\nHo").unwrap().is_none());
//!
//! let src = b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n";
//! let head = decoder.decode(src).unwrap().unwrap();
//! assert_eq!(head.url(src), b"/index.html");
//! ```

use crate::codec::body::LengthDecoder;
use crate::codec::header::{HeaderLine, parse_header, parse_request_line};
use crate::codec::line::{LineScanner, LineStatus};
use crate::protocol::{ParseError, PayloadSize, RequestHead};

/// Which part of the request the decoder is waiting for.
///
/// Within one request the phase only moves forward; it returns to
/// `RequestLine` through [`RequestDecoder::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    RequestLine,
    Header,
    Body,
}

/// A decoder for HTTP requests that handles the request line, headers and payload
///
/// # State Machine
///
/// - `RequestLine`: the first line is parsed into method, url and version
/// - `Header`: header lines are parsed until the blank line
/// - `Body`: waits until `Content-Length` bytes follow the blank line
#[derive(Debug, Default)]
pub struct RequestDecoder {
    phase: Phase,
    scanner: LineScanner,
    head: RequestHead,
    payload_decoder: Option<LengthDecoder>,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Default::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The head decoded so far.
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    /// Number of bytes of the read buffer the decoder has consumed.
    pub fn checked_index(&self) -> usize {
        self.scanner.checked_index()
    }

    /// Offset of the line currently being assembled.
    pub fn start_line(&self) -> usize {
        self.scanner.start_line()
    }

    /// Forgets the current request, ready for the next one on the same connection.
    pub fn reset(&mut self) {
        self.phase = Phase::RequestLine;
        self.scanner.reset();
        self.head = RequestHead::default();
        self.payload_decoder = None;
    }

    /// Attempts to decode a request from `src`, the filled part of the read buffer
    ///
    /// `src` must keep the bytes seen by earlier calls in place; it may only grow.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))`: the request is complete
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the request is malformed
    pub fn decode(&mut self, src: &[u8]) -> Result<Option<&RequestHead>, ParseError> {
        loop {
            // the body is not line oriented, enough bytes is as good as a line
            if let Some(payload_decoder) = &self.payload_decoder {
                return match payload_decoder.decode(src) {
                    Some(_body) => Ok(Some(&self.head)),
                    None => Ok(None),
                };
            }

            let line = match self.scanner.next_line(src) {
                LineStatus::Complete(line) => line,
                LineStatus::Open => return Ok(None),
                LineStatus::Bad { offset } => return Err(ParseError::InvalidLine { offset }),
            };

            match self.phase {
                Phase::RequestLine => {
                    parse_request_line(src, line, &mut self.head)?;
                    self.phase = Phase::Header;
                }
                Phase::Header => {
                    if parse_header(src, line, &mut self.head)? == HeaderLine::End {
                        match self.head.payload_size() {
                            PayloadSize::Empty => return Ok(Some(&self.head)),
                            PayloadSize::Length(length) => {
                                self.phase = Phase::Body;
                                self.payload_decoder = Some(LengthDecoder::new(self.scanner.checked_index(), length));
                            }
                        }
                    }
                }
                // a payload decoder always exists in this phase
                Phase::Body => return Ok(None),
            }
        }
    }
}
