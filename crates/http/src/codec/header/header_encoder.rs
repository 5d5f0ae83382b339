//! HTTP header encoder implementation for serializing HTTP response headers
//!
//! Every response carries the same header set:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 1024\r\n
//! Connection: keep-alive\r\n
//! \r\n
//! ```

use crate::codec::WriteBuffer;
use crate::protocol::{ResponseHead, SendError};

/// Encoder for HTTP response headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl HeaderEncoder {
    /// Encodes the status line, the headers and the blank line into `dst`.
    ///
    /// # Errors
    ///
    /// Returns `SendError::BufferFull` if the head does not fit in `dst`.
    pub fn encode(&mut self, head: ResponseHead, dst: &mut WriteBuffer) -> Result<(), SendError> {
        let status = head.status();
        dst.put_fmt(format_args!("HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or("")))?;
        dst.put_fmt(format_args!("Content-Type: {}\r\n", mime::TEXT_HTML))?;
        dst.put_fmt(format_args!("Content-Length: {}\r\n", head.content_length()))?;
        dst.put_fmt(format_args!("Connection: {}\r\n", if head.keep_alive() { "keep-alive" } else { "close" }))?;
        dst.put_slice(b"\r\n")
    }
}
