use std::fmt;
use std::fs::File;
use std::io::{self, Read};

use memmap2::{Mmap, MmapOptions};

/// The bytes of a resolved file, ready to be sent as the response body.
///
/// A mapping is released when the body is dropped; the descriptor it was
/// created from is not needed to keep it alive.
pub enum FileBody {
    Mapped(Mmap),
    Buffered(Vec<u8>),
    Empty,
}

impl FileBody {
    #[inline]
    pub fn len(&self) -> usize {
        self.as_ref().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, FileBody::Mapped(_))
    }
}

impl AsRef<[u8]> for FileBody {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBody::Mapped(mmap) => mmap,
            FileBody::Buffered(buf) => buf,
            FileBody::Empty => &[],
        }
    }
}

impl fmt::Debug for FileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileBody::Mapped(mmap) => f.debug_tuple("Mapped").field(&mmap.len()).finish(),
            FileBody::Buffered(buf) => f.debug_tuple("Buffered").field(&buf.len()).finish(),
            FileBody::Empty => f.write_str("Empty"),
        }
    }
}

/// Turns an opened file into a [`FileBody`].
///
/// The connection only ever sees the resulting bytes, so a platform without
/// memory mapping can plug in [`BufferedLoader`] instead of [`MmapLoader`].
pub trait FileLoader: Send + Sync + fmt::Debug {
    /// Loads `len` bytes from `file`, which is closed once this returns.
    fn load(&self, file: File, len: u64) -> io::Result<FileBody>;
}

/// Maps files read-only and private.
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapLoader;

impl FileLoader for MmapLoader {
    fn load(&self, file: File, len: u64) -> io::Result<FileBody> {
        // an empty file cannot be mapped
        if len == 0 {
            return Ok(FileBody::Empty);
        }

        // SAFETY: the mapping is private and read-only. Files under the document
        // root are expected not to be truncated while they are being served.
        let mmap = unsafe { MmapOptions::new().map_copy_read_only(&file)? };
        Ok(FileBody::Mapped(mmap))
    }
}

/// Reads the whole file into memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferedLoader;

impl FileLoader for BufferedLoader {
    fn load(&self, mut file: File, len: u64) -> io::Result<FileBody> {
        if len == 0 {
            return Ok(FileBody::Empty);
        }

        let capacity = usize::try_from(len).map_err(io::Error::other)?;
        let mut buf = Vec::with_capacity(capacity);
        file.read_to_end(&mut buf)?;
        Ok(FileBody::Buffered(buf))
    }
}
