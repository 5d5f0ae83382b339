//! HTTP connection handling module
//!
//! This module holds the per-socket state of the server.
//!
//! # Components
//!
//! - [`HttpConnection`]: one accepted socket, which:
//!   - accumulates request bytes in a [`ReadBuffer`]
//!   - decodes the request and resolves the file on a worker thread
//!   - sends the head and the file body with vectored writes
//!   - is reset and reused for the next request when kept alive
//!
//! - [`Handoff`]: a connection travelling back from a worker to the reactor,
//!   together with the [`NextStep`] the reactor applies to its socket

mod http_connection;
mod read_buffer;

pub use http_connection::{Handoff, HttpConnection, NextStep, WriteStatus};
pub use read_buffer::ReadBuffer;
