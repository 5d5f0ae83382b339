use std::fmt;
use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

use crate::ensure;
use crate::protocol::SendError;

/// Fixed-capacity buffer holding a response head and, for error responses, the page.
///
/// Writes never grow the buffer past its capacity; an oversized write fails
/// without modifying the buffer.
#[derive(Debug)]
pub struct WriteBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl WriteBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), capacity }
    }

    /// Number of bytes queued for sending.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn put_slice(&mut self, src: &[u8]) -> Result<(), SendError> {
        ensure!(src.len() <= self.remaining(), SendError::buffer_full(src.len(), self.remaining()));
        self.buf.put_slice(src);
        Ok(())
    }

    pub fn put_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), SendError> {
        let mut line = String::new();
        // writing into a String never fails
        let _ = line.write_fmt(args);
        self.put_slice(line.as_bytes())
    }
}

impl AsRef<[u8]> for WriteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.buf.as_ref()
    }
}
