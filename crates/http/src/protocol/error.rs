use std::io;

use http::StatusCode;
use thiserror::Error;

/// Errors raised while decoding the request line and header section.
///
/// Every variant is answered with `400 Bad Request`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed line terminator at offset {offset}")]
    InvalidLine { offset: usize },

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http version")]
    InvalidVersion,

    #[error("invalid http uri: {reason}")]
    InvalidUri { reason: String },

    #[error("missing {token} in request line")]
    MissingToken { token: &'static str },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },
}

impl ParseError {
    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn missing(token: &'static str) -> Self {
        Self::MissingToken { token }
    }
}

/// Terminal failure of a request, always answered with an error page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServeError {
    #[error("syntax error: {source}")]
    Syntax {
        #[from]
        source: ParseError,
    },

    #[error("resource not found")]
    ResourceMissing,

    #[error("resource is not world readable")]
    AccessDenied,

    #[error("directories are not served")]
    DirectoryRequested,

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl ServeError {
    pub fn internal<S: ToString>(str: S) -> Self {
        Self::Internal { reason: str.to_string() }
    }

    /// The status code the error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Syntax { .. } | ServeError::DirectoryRequested => StatusCode::BAD_REQUEST,
            ServeError::ResourceMissing => StatusCode::NOT_FOUND,
            ServeError::AccessDenied => StatusCode::FORBIDDEN,
            ServeError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors on the read path. The connection is torn down without a response.
#[derive(Error, Debug)]
pub enum ConnError {
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("read buffer is full, capacity {capacity}")]
    BufferFull { capacity: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Errors while building or transmitting a response.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("response header exceed the write buffer, need {required} but only {remaining} left")]
    BufferFull { required: usize, remaining: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn buffer_full(required: usize, remaining: usize) -> Self {
        Self::BufferFull { required, remaining }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
