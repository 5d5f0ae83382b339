//! Resolution of request urls to files under the document root.
//!
//! [`Resolver::resolve`] maps a decoded url to either the bytes to send or the
//! [`ServeError`] the request is answered with. How the file bytes are obtained
//! is left to a [`FileLoader`].

mod loader;

pub use loader::{BufferedLoader, FileBody, FileLoader, MmapLoader};

use std::ffi::OsString;
use std::fs::{self, File};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error};

use crate::protocol::ServeError;

const WORLD_READABLE: u32 = 0o004;

#[derive(Debug, Clone)]
pub struct Resolver {
    doc_root: PathBuf,
    max_path_len: usize,
    loader: Arc<dyn FileLoader>,
}

impl Resolver {
    pub fn new(doc_root: PathBuf, max_path_len: usize, loader: Arc<dyn FileLoader>) -> Self {
        Self { doc_root, max_path_len, loader }
    }

    pub fn doc_root(&self) -> &Path {
        &self.doc_root
    }

    /// Joins the document root and `url`, keeping at most `max_path_len - 1` bytes.
    pub fn compose_path(&self, url: &[u8]) -> PathBuf {
        let mut bytes = self.doc_root.as_os_str().as_bytes().to_vec();
        bytes.extend_from_slice(url);
        bytes.truncate(self.max_path_len.saturating_sub(1));
        PathBuf::from(OsString::from_vec(bytes))
    }

    /// Resolves `url` to the body of a `200 OK`.
    ///
    /// # Errors
    ///
    /// - `ResourceMissing` if nothing exists at the path
    /// - `AccessDenied` if the file is not readable by others
    /// - `DirectoryRequested` if the path names a directory
    /// - `Internal` if the file exists but cannot be opened or loaded
    pub fn resolve(&self, url: &[u8]) -> Result<FileBody, ServeError> {
        let path = self.compose_path(url);

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), cause = %e, "resource not found");
                return Err(ServeError::ResourceMissing);
            }
        };

        if metadata.permissions().mode() & WORLD_READABLE == 0 {
            return Err(ServeError::AccessDenied);
        }

        if metadata.is_dir() {
            return Err(ServeError::DirectoryRequested);
        }

        let file = File::open(&path).map_err(|e| {
            error!(path = %path.display(), cause = %e, "can't open resource");
            ServeError::internal(e)
        })?;

        self.loader.load(file, metadata.len()).map_err(|e| {
            error!(path = %path.display(), cause = %e, "can't load resource");
            ServeError::internal(e)
        })
    }
}
