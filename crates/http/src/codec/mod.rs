//! HTTP codec module for decoding requests and encoding responses
//!
//! Decoding runs over the bytes a connection has accumulated so far and can be
//! resumed at any byte boundary. Encoding writes into a fixed-capacity
//! [`WriteBuffer`]; the file body itself never passes through the codec.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestDecoder`]: drives the [`Phase`] state machine
//!   - [`LineScanner`]: finds `\r\n` terminated lines
//!   - header and request line parsing via the `header` module
//!   - body length tracking via the `body` module
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: status line, headers and error pages
//!   - [`WriteBuffer`]: bounded destination for the encoded head
//!
//! # Example
//!
//! ```
//! use micro_static::codec::{RequestDecoder, ResponseEncoder, WriteBuffer};
//!
//! let src = b"GET /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";
//! let mut decoder = RequestDecoder::new();
//! let head = decoder.decode(src).unwrap().unwrap();
//!
//! let mut dst = WriteBuffer::with_capacity(1024);
//! ResponseEncoder::new().encode_file(11, head.keep_alive(), &mut dst).unwrap();
//! assert!(dst.as_ref().starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

mod body;
mod header;
mod line;
mod request_decoder;
mod response_encoder;
mod write_buffer;

pub use line::{LineScanner, LineStatus};
pub use request_decoder::{Phase, RequestDecoder};
pub use response_encoder::{ResponseEncoder, error_page};
pub use write_buffer::WriteBuffer;
