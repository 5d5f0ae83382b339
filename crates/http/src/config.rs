//! Engine configuration.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::fs::{FileLoader, MmapLoader, Resolver};

pub const DEFAULT_READ_BUFFER_SIZE: usize = 2048;
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_MAX_PATH_LEN: usize = 200;
pub const DEFAULT_MAX_CONNECTIONS: usize = 65535;
pub const DEFAULT_MAX_EVENTS: usize = 10000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    doc_root: PathBuf,
    read_buffer_size: usize,
    write_buffer_size: usize,
    max_path_len: usize,
    max_connections: usize,
    max_events: usize,
    loader: Arc<dyn FileLoader>,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Absolute directory every url resolves under.
    pub fn doc_root(&self) -> &PathBuf {
        &self.doc_root
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn write_buffer_size(&self) -> usize {
        self.write_buffer_size
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    /// Connections accepted beyond this count are closed right away.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Capacity of the readiness event batch.
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.doc_root.clone(), self.max_path_len, self.loader.clone())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("document root must be set")]
    MissingDocRoot,

    #[error("document root {path} is not a directory")]
    InvalidDocRoot { path: PathBuf },

    #[error("{name} must be positive")]
    ZeroSize { name: &'static str },

    #[error("document root {path} leaves no room for a url within {max_path_len} bytes")]
    DocRootTooLong { path: PathBuf, max_path_len: usize },
}

#[derive(Debug)]
pub struct ServerConfigBuilder {
    doc_root: Option<PathBuf>,
    read_buffer_size: usize,
    write_buffer_size: usize,
    max_path_len: usize,
    max_connections: usize,
    max_events: usize,
    loader: Arc<dyn FileLoader>,
}

impl ServerConfigBuilder {
    fn new() -> Self {
        Self {
            doc_root: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_events: DEFAULT_MAX_EVENTS,
            loader: Arc::new(MmapLoader),
        }
    }

    pub fn doc_root(mut self, doc_root: impl Into<PathBuf>) -> Self {
        self.doc_root = Some(doc_root.into());
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    pub fn max_path_len(mut self, len: usize) -> Self {
        self.max_path_len = len;
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn loader(mut self, loader: impl FileLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let doc_root = self.doc_root.ok_or(ConfigError::MissingDocRoot)?;
        if !doc_root.is_dir() {
            return Err(ConfigError::InvalidDocRoot { path: doc_root });
        }

        for (name, size) in [
            ("read buffer size", self.read_buffer_size),
            ("write buffer size", self.write_buffer_size),
            ("max path length", self.max_path_len),
            ("max connections", self.max_connections),
            ("max events", self.max_events),
        ] {
            if size == 0 {
                return Err(ConfigError::ZeroSize { name });
            }
        }

        // composed paths keep max_path_len - 1 bytes, the url needs at least one
        if doc_root.as_os_str().len() + 1 >= self.max_path_len {
            return Err(ConfigError::DocRootTooLong { path: doc_root, max_path_len: self.max_path_len });
        }

        Ok(ServerConfig {
            doc_root,
            read_buffer_size: self.read_buffer_size,
            write_buffer_size: self.write_buffer_size,
            max_path_len: self.max_path_len,
            max_connections: self.max_connections,
            max_events: self.max_events,
            loader: self.loader,
        })
    }
}
