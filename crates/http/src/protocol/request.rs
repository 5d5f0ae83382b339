//! The parsed head of a request.
//!
//! Textual fields are kept as byte ranges into the connection's read buffer
//! rather than as copies. The ranges are only meaningful for the request
//! currently being decoded and are cleared together with the decoder state.

use std::ops::Range;

use http::{Method, Version};

use crate::protocol::PayloadSize;

/// Request line and recognised header fields of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub(crate) method: Method,
    pub(crate) url: Range<usize>,
    pub(crate) version: Version,
    pub(crate) host: Option<Range<usize>>,
    pub(crate) payload_size: PayloadSize,
    pub(crate) keep_alive: bool,
}

impl Default for RequestHead {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: 0..0,
            version: Version::HTTP_11,
            host: None,
            payload_size: PayloadSize::Empty,
            keep_alive: false,
        }
    }
}

impl RequestHead {
    /// Returns a reference to the request's HTTP method, always `GET` once decoded.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The request path, with any `http://authority` prefix already removed.
    pub fn url<'buf>(&self, buf: &'buf [u8]) -> &'buf [u8] {
        &buf[self.url.clone()]
    }

    /// The verbatim `Host` header value, if the request carried one.
    pub fn host<'buf>(&self, buf: &'buf [u8]) -> Option<&'buf [u8]> {
        self.host.clone().map(|range| &buf[range])
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// Whether the client asked for `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}
