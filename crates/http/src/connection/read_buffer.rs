use std::io::{self, Read};

use crate::protocol::ConnError;

/// Fixed-capacity buffer the request bytes accumulate in.
///
/// Bytes are appended at `read_index` and never move; the decoder refers to
/// them by offset until the buffer is cleared for the next request.
#[derive(Debug)]
pub struct ReadBuffer {
    buf: Box<[u8]>,
    read_index: usize,
}

impl ReadBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: vec![0; capacity].into_boxed_slice(), read_index: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes filled so far.
    #[inline]
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.read_index == self.buf.len()
    }

    /// The filled part of the buffer.
    #[inline]
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.read_index]
    }

    pub fn clear(&mut self) {
        self.read_index = 0;
    }

    /// Reads from the non-blocking `src` until it would block.
    ///
    /// Returns the number of bytes appended, which may be zero. Reading also
    /// stops once the buffer fills up; the next call then fails.
    ///
    /// # Errors
    ///
    /// - `ConnError::BufferFull` if the buffer is full before reading
    /// - `ConnError::PeerClosed` if the peer shut its side down
    /// - `ConnError::Io` on any other read failure
    pub fn read_from<R: Read>(&mut self, src: &mut R) -> Result<usize, ConnError> {
        if self.is_full() {
            return Err(ConnError::BufferFull { capacity: self.capacity() });
        }

        let mut received = 0;
        while !self.is_full() {
            match src.read(&mut self.buf[self.read_index..]) {
                Ok(0) => return Err(ConnError::PeerClosed),
                Ok(n) => {
                    self.read_index += n;
                    received += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }
}
