//! A reactor based micro HTTP/1.1 static file server
//!
//! This crate serves files below a document root over raw non-blocking sockets.
//! One reactor thread multiplexes every socket with `mio` and performs all
//! socket I/O; a bounded pool of worker threads decodes requests and builds
//! responses. File bodies are memory mapped and sent together with the response
//! head in vectored writes, so their bytes are never copied.
//!
//! # Features
//!
//! - `GET` over HTTP/1.1, with `Content-Length` delimited request bodies
//! - Keep-alive connections
//! - Resumable request parsing, independent of how the bytes are split across reads
//! - Memory mapped or buffered file bodies, see [`fs::FileLoader`]
//! - Bounded request queue and connection count
//!
//! # Example
//!
//! ```no_run
//! use mio::net::TcpListener;
//! use micro_static::config::ServerConfig;
//! use micro_static::pool::ThreadPool;
//! use micro_static::reactor::Reactor;
//!
//! let config = ServerConfig::builder().doc_root("/var/www/html").build().unwrap();
//! let pool = ThreadPool::new(8, 10000).unwrap();
//! let listener = TcpListener::bind("127.0.0.1:8080".parse().unwrap()).unwrap();
//!
//! let mut reactor = Reactor::new(listener, config, pool).unwrap();
//! reactor.run().unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`reactor`]: the event loop, the shared [`reactor::ServerContext`] and shutdown
//! - [`connection`]: per-socket state, reading, response preparation and writing
//! - [`pool`]: the worker threads and their bounded FIFO queue
//! - [`codec`]: request decoding and response encoding
//! - [`fs`]: resolution of urls to files under the document root
//! - [`protocol`]: request and response heads, the error taxonomy
//! - [`config`]: engine configuration
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`] and [`protocol::ServeError`] are answered with an error page
//! - [`protocol::ConnError`] and [`protocol::SendError`] close the connection
//! - [`reactor::ReactorError`] stops the event loop
//!
//! # Limitations
//!
//! - HTTP/1.1 only, `GET` only
//! - No chunked transfer encoding
//! - No TLS support (use a reverse proxy for HTTPS)
//! - No timeouts: an idle client keeps its connection until it closes it

pub mod codec;
pub mod config;
pub mod connection;
pub mod fs;
pub mod pool;
pub mod protocol;
pub mod reactor;

mod utils;
pub(crate) use utils::ensure;
