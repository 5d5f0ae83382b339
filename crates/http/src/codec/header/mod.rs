//! HTTP header processing module for encoding and decoding headers
//!
//! # Components
//!
//! - [`parse_request_line`] / [`parse_header`]: decode one line of the request head
//!   - Only `GET` over `HTTP/1.1` is accepted
//!   - `Connection`, `Content-Length` and `Host` are recognised
//!
//! - [`HeaderEncoder`]: encodes the status line and response headers
//!   - `Content-Type`, `Content-Length` and `Connection` on every response

mod header_decoder;
mod header_encoder;

pub use header_decoder::{HeaderLine, parse_header, parse_request_line};
pub use header_encoder::HeaderEncoder;
