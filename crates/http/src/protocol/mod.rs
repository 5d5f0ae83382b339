//! Core HTTP protocol abstractions.
//!
//! This module provides the types exchanged between the decoder, the resource
//! resolver and the response encoder:
//!
//! - **Message Handling** ([`message`]): payload size of a request
//!   - [`PayloadSize`]: declared body length
//!
//! - **Request Processing** ([`request`]): the decoded request head
//!   - [`RequestHead`]: method, url, version, host and keep-alive flag
//!
//! - **Response Processing** ([`response`]): values that vary per response
//!   - [`ResponseHead`]: status, content length and keep-alive flag
//!
//! - **Error Handling** ([`error`]): the error taxonomy
//!   - [`ParseError`]: malformed request line or headers
//!   - [`ServeError`]: terminal outcomes answered with an error page
//!   - [`ConnError`]: read path failures that tear the connection down
//!   - [`SendError`]: response building and transmission failures

mod message;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ResponseHead;

mod error;
pub use error::ConnError;
pub use error::ParseError;
pub use error::SendError;
pub use error::ServeError;
