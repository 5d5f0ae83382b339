//! Request line and header field parsing.
//!
//! Each function receives one complete line, given as a range into the read
//! buffer, and records what it finds into a [`RequestHead`]. Only the fields
//! the server acts on are recognised:
//!
//! - `Connection` (`keep-alive` turns on connection reuse)
//! - `Content-Length`
//! - `Host`
//!
//! Header names are matched case-insensitively and whitespace after the colon
//! is skipped. Any other header is ignored.

use std::ops::Range;

use http::{Method, Version};
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, RequestHead};

const CONNECTION: &[u8] = b"connection:";
const CONTENT_LENGTH: &[u8] = b"content-length:";
const HOST: &[u8] = b"host:";

const HTTP_SCHEME: &[u8] = b"http://";

/// Outcome of feeding one line of the header section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLine {
    /// A header field, recognised or not.
    Field,
    /// The empty line closing the header section.
    End,
}

/// Parses `METHOD SP URL SP VERSION`.
///
/// # Errors
///
/// Returns `ParseError` if:
/// - the method or version token is missing
/// - the method is anything but `GET`
/// - the version is anything but `HTTP/1.1`
/// - the url does not resolve to an absolute path or walks up with `..`
pub fn parse_request_line(src: &[u8], line: Range<usize>, head: &mut RequestHead) -> Result<(), ParseError> {
    let text = &src[line.clone()];

    let (method_end, url_start) = split_token(text).ok_or(ParseError::missing("url"))?;
    ensure!(text[..method_end].eq_ignore_ascii_case(b"GET"), ParseError::InvalidMethod);

    let (url_len, version_offset) = split_token(&text[url_start..]).ok_or(ParseError::missing("version"))?;
    let version = &text[url_start + version_offset..];
    ensure!(version.eq_ignore_ascii_case(b"HTTP/1.1"), ParseError::InvalidVersion);

    let mut url = url_start..url_start + url_len;
    if text[url.clone()].get(..HTTP_SCHEME.len()).is_some_and(|scheme| scheme.eq_ignore_ascii_case(HTTP_SCHEME)) {
        let authority_start = url.start + HTTP_SCHEME.len();
        let path_offset = text[authority_start..url.end]
            .iter()
            .position(|b| *b == b'/')
            .ok_or_else(|| ParseError::invalid_uri("absolute url without path"))?;
        url.start = authority_start + path_offset;
    }

    let path = &text[url.clone()];
    ensure!(path.first() == Some(&b'/'), ParseError::invalid_uri("path must start with '/'"));
    ensure!(!path.split(|b| *b == b'/').any(|segment| segment == b".."), ParseError::invalid_uri("parent segment"));

    head.method = Method::GET;
    head.version = Version::HTTP_11;
    head.url = line.start + url.start..line.start + url.end;
    Ok(())
}

/// Parses one header line, or recognises the blank line ending the section.
///
/// # Errors
///
/// Returns `ParseError::InvalidContentLength` if the `Content-Length` value is
/// not a non-negative integer. Every other line is accepted.
pub fn parse_header(src: &[u8], line: Range<usize>, head: &mut RequestHead) -> Result<HeaderLine, ParseError> {
    let text = &src[line.clone()];
    if text.is_empty() {
        return Ok(HeaderLine::End);
    }

    if let Some(value) = header_value(text, CONNECTION) {
        if text[value].eq_ignore_ascii_case(b"keep-alive") {
            head.keep_alive = true;
        }
    } else if let Some(value) = header_value(text, CONTENT_LENGTH) {
        let raw = text[value].trim_ascii_end();
        let length = std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| ParseError::invalid_content_length(format!("value {} is not u64", String::from_utf8_lossy(raw))))?;
        head.payload_size = PayloadSize::new_length(length);
    } else if let Some(value) = header_value(text, HOST) {
        head.host = Some(line.start + value.start..line.start + value.end);
    } else {
        trace!(header = %String::from_utf8_lossy(text), "skip unknown header");
    }

    Ok(HeaderLine::Field)
}

/// Splits off the first token. Returns the token length and the offset of the
/// byte following the whitespace run after it.
fn split_token(text: &[u8]) -> Option<(usize, usize)> {
    let token_end = text.iter().position(|b| is_space(*b))?;
    let next = text[token_end..].iter().position(|b| !is_space(*b)).map_or(text.len(), |skip| token_end + skip);
    Some((token_end, next))
}

/// Range of the value of `name` in `text`, leading whitespace skipped.
fn header_value(text: &[u8], name: &[u8]) -> Option<Range<usize>> {
    if text.len() < name.len() || !text[..name.len()].eq_ignore_ascii_case(name) {
        return None;
    }
    let skip = text[name.len()..].iter().take_while(|b| is_space(**b)).count();
    Some(name.len() + skip..text.len())
}

#[inline]
fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
