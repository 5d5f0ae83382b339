use http::StatusCode;

use crate::codec::WriteBuffer;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{ResponseHead, SendError, ServeError};

const ERROR_400_FORM: &str = "Your request has bad syntax or is inherently impossible to satisfy.\n";
const ERROR_403_FORM: &str = "You do not have permission to get file from this server.\n";
const ERROR_404_FORM: &str = "The requested file was not found on this server.\n";
const ERROR_500_FORM: &str = "There was an unusual problem serving the requested file.\n";

/// Writes response heads and error pages into a connection's write buffer.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Encodes the head of a `200 OK` whose body of `content_length` bytes is sent separately.
    pub fn encode_file(&mut self, content_length: u64, keep_alive: bool, dst: &mut WriteBuffer) -> Result<(), SendError> {
        self.header_encoder.encode(ResponseHead::new(StatusCode::OK, content_length, keep_alive), dst)
    }

    /// Encodes a complete error response, page included, for `error`.
    pub fn encode_error(&mut self, error: &ServeError, keep_alive: bool, dst: &mut WriteBuffer) -> Result<(), SendError> {
        let status = error.status();
        let page = error_page(status);
        self.header_encoder.encode(ResponseHead::new(status, page.len() as u64, keep_alive), dst)?;
        dst.put_slice(page.as_bytes())
    }
}

/// The page sent as body of an error response.
pub fn error_page(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => ERROR_400_FORM,
        StatusCode::FORBIDDEN => ERROR_403_FORM,
        StatusCode::NOT_FOUND => ERROR_404_FORM,
        _ => ERROR_500_FORM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ParseError;

    fn encode_error(error: ServeError) -> String {
        let mut dst = WriteBuffer::with_capacity(1024);
        ResponseEncoder::new().encode_error(&error, false, &mut dst).unwrap();
        String::from_utf8(dst.as_ref().to_vec()).unwrap()
    }

    #[test]
    fn each_error_has_its_own_page() {
        let forbidden = encode_error(ServeError::AccessDenied);
        assert!(forbidden.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert!(forbidden.ends_with(ERROR_403_FORM));

        let missing = encode_error(ServeError::ResourceMissing);
        assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(missing.ends_with(ERROR_404_FORM));

        let internal = encode_error(ServeError::internal("mmap failed"));
        assert!(internal.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(internal.ends_with(ERROR_500_FORM));
    }

    #[test]
    fn bad_request_outcomes() {
        for error in [ServeError::from(ParseError::InvalidMethod), ServeError::DirectoryRequested] {
            let response = encode_error(error);
            assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
            assert!(response.contains(&format!("Content-Length: {}\r\n", ERROR_400_FORM.len())));
            assert!(response.ends_with(&format!("\r\n\r\n{ERROR_400_FORM}")));
        }
    }

    #[test]
    fn file_head_only() {
        let mut dst = WriteBuffer::with_capacity(1024);
        ResponseEncoder::new().encode_file(42, true, &mut dst).unwrap();

        let text = String::from_utf8(dst.as_ref().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 42\r\n"));
        assert!(text.ends_with("Connection: keep-alive\r\n\r\n"));
    }

    #[test]
    fn page_does_not_fit() {
        let mut dst = WriteBuffer::with_capacity(100);
        let result = ResponseEncoder::new().encode_error(&ServeError::ResourceMissing, false, &mut dst);
        assert!(matches!(result, Err(SendError::BufferFull { .. })));
    }
}
