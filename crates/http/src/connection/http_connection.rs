use std::io::{self, IoSlice, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use mio::net::TcpStream;
use mio::{Interest, Registry, Token};
use tracing::{debug, error, info, trace};

use crate::codec::{RequestDecoder, ResponseEncoder, WriteBuffer};
use crate::connection::ReadBuffer;
use crate::fs::FileBody;
use crate::pool::Process;
use crate::protocol::{ConnError, SendError, ServeError};
use crate::reactor::ServerContext;

/// What the reactor does with a connection a worker has finished with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Register the socket again for `Interest`.
    Rearm(Interest),
    Close,
}

/// A connection returned to the reactor by a worker.
#[derive(Debug)]
pub struct Handoff {
    pub conn: Box<HttpConnection>,
    pub next: NextStep,
}

/// Progress of [`HttpConnection::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The socket would block, wait for writability.
    Pending,
    /// Every byte of the response has been sent.
    Done,
}

/// An HTTP connection serving one request at a time
///
/// `HttpConnection` carries everything needed between accepting a socket and
/// closing it:
/// - the read buffer and the resumable request decoder
/// - the write buffer holding the encoded head
/// - the file body of the current response
///
/// A connection is owned by exactly one party at any time: the reactor while it
/// reads or writes the socket, or a worker while it decodes the request and
/// builds the response. The socket is never touched by a worker.
pub struct HttpConnection {
    stream: TcpStream,
    peer: SocketAddr,
    token: Token,
    interest: Interest,
    context: Arc<ServerContext>,

    read_buf: ReadBuffer,
    decoder: RequestDecoder,
    keep_alive: bool,

    encoder: ResponseEncoder,
    write_buf: WriteBuffer,
    body: Option<FileBody>,
    segment_count: usize,
    bytes_to_send: usize,
    bytes_sent: usize,
}

impl HttpConnection {
    pub fn new(stream: TcpStream, peer: SocketAddr, token: Token, context: Arc<ServerContext>) -> Self {
        let config = context.config();
        let read_buf = ReadBuffer::with_capacity(config.read_buffer_size());
        let write_buf = WriteBuffer::with_capacity(config.write_buffer_size());

        Self {
            stream,
            peer,
            token,
            interest: Interest::READABLE,
            context,
            read_buf,
            decoder: RequestDecoder::new(),
            keep_alive: false,
            encoder: ResponseEncoder::new(),
            write_buf,
            body: None,
            segment_count: 0,
            bytes_to_send: 0,
            bytes_sent: 0,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// The interest the socket was last registered with.
    pub fn interest(&self) -> Interest {
        self.interest
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn decoder(&self) -> &RequestDecoder {
        &self.decoder
    }

    pub fn read_buffer(&self) -> &ReadBuffer {
        &self.read_buf
    }

    /// Whether a file body is held for the current response.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub(crate) fn register(&mut self, registry: &Registry, interest: Interest) -> io::Result<()> {
        registry.register(&mut self.stream, self.token, interest)?;
        self.interest = interest;
        Ok(())
    }

    pub(crate) fn rearm(&mut self, registry: &Registry, interest: Interest) -> io::Result<()> {
        registry.reregister(&mut self.stream, self.token, interest)?;
        self.interest = interest;
        Ok(())
    }

    pub(crate) fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.stream)
    }

    /// Forgets the request just answered, ready for the next one on this socket.
    ///
    /// Bytes the client pipelined after the request are discarded.
    pub fn reset(&mut self) {
        self.read_buf.clear();
        self.decoder.reset();
        self.keep_alive = false;
        self.write_buf.clear();
        self.body = None;
        self.segment_count = 0;
        self.bytes_to_send = 0;
        self.bytes_sent = 0;
    }

    /// Drains the socket into the read buffer.
    ///
    /// # Errors
    ///
    /// Fails if the buffer was already full, the peer closed the connection or
    /// the read failed; the connection must then be closed.
    pub fn read(&mut self) -> Result<usize, ConnError> {
        let received = self.read_buf.read_from(&mut self.stream)?;
        trace!(peer = %self.peer, received, "read from socket");
        Ok(received)
    }

    /// Decodes what has been read so far and, once the request is complete,
    /// prepares the response.
    pub fn process_request(&mut self) -> NextStep {
        let decoded = match self.decoder.decode(self.read_buf.filled()) {
            Ok(None) => return NextStep::Rearm(Interest::READABLE),
            Ok(Some(head)) => Ok((head.keep_alive(), head.url.clone())),
            Err(e) => Err(e),
        };

        let outcome = match decoded {
            Ok((keep_alive, url)) => {
                self.keep_alive = keep_alive;
                let url = &self.read_buf.filled()[url];
                trace!(peer = %self.peer, url = %String::from_utf8_lossy(url), "request decoded");
                self.do_request(url)
            }
            Err(e) => {
                info!(peer = %self.peer, cause = %e, "bad request");
                self.keep_alive = false;
                Err(e.into())
            }
        };

        match self.process_write(outcome) {
            Ok(()) => NextStep::Rearm(Interest::WRITABLE),
            Err(e) => {
                error!(peer = %self.peer, cause = %e, "can't build response");
                self.body = None;
                NextStep::Close
            }
        }
    }

    fn do_request(&self, url: &[u8]) -> Result<FileBody, ServeError> {
        self.context.resolver().resolve(url)
    }

    /// Encodes the response for `outcome` and lays out the segments to send.
    pub fn process_write(&mut self, outcome: Result<FileBody, ServeError>) -> Result<(), SendError> {
        self.write_buf.clear();
        self.body = None;

        match outcome {
            Ok(body) => {
                self.encoder.encode_file(body.len() as u64, self.keep_alive, &mut self.write_buf)?;
                self.segment_count = if body.is_empty() { 1 } else { 2 };
                self.bytes_to_send = self.write_buf.len() + body.len();
                self.body = Some(body);
            }
            Err(e) => {
                debug!(peer = %self.peer, status = %e.status(), cause = %e, "serve error");
                self.encoder.encode_error(&e, self.keep_alive, &mut self.write_buf)?;
                self.segment_count = 1;
                self.bytes_to_send = self.write_buf.len();
            }
        }

        self.bytes_sent = 0;
        Ok(())
    }

    /// Sends the prepared response with vectored writes until done or the socket would block.
    ///
    /// The body is released once it has been sent or the write failed.
    ///
    /// # Errors
    ///
    /// Returns `SendError::Io` if the socket failed; the connection must then be closed.
    pub fn write(&mut self) -> Result<WriteStatus, SendError> {
        while self.bytes_sent < self.bytes_to_send {
            let head = self.write_buf.as_ref();
            let body = self.body.as_ref().map_or(&[][..], |body| body.as_ref());

            let sent_of_head = self.bytes_sent.min(head.len());
            let sent_of_body = self.bytes_sent - sent_of_head;
            let segments = [IoSlice::new(&head[sent_of_head..]), IoSlice::new(&body[sent_of_body..])];

            match self.stream.write_vectored(&segments[..self.segment_count]) {
                Ok(0) => {
                    self.body = None;
                    return Err(SendError::io(io::Error::from(io::ErrorKind::WriteZero)));
                }
                Ok(n) => self.bytes_sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(WriteStatus::Pending),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.body = None;
                    return Err(e.into());
                }
            }
        }

        trace!(peer = %self.peer, bytes = self.bytes_sent, "response sent");
        self.body = None;
        Ok(WriteStatus::Done)
    }
}

impl Process for HttpConnection {
    fn process(mut self: Box<Self>) {
        let next = self.process_request();
        let context = self.context.clone();
        context.complete(Handoff { conn: self, next });
    }
}

impl std::fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection")
            .field("peer", &self.peer)
            .field("token", &self.token)
            .field("interest", &self.interest)
            .field("phase", &self.decoder.phase())
            .field("keep_alive", &self.keep_alive)
            .field("bytes_sent", &self.bytes_sent)
            .field("bytes_to_send", &self.bytes_to_send)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Phase, error_page};
    use crate::config::{ServerConfig, ServerConfigBuilder};
    use crossbeam_channel::unbounded;
    use http::StatusCode;
    use mio::{Poll, Waker};
    use std::fs::{self, Permissions};
    use std::io::Read;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, Instant};

    const INDEX: &[u8] = b"<h1>index</h1>";

    struct Fixture {
        conn: HttpConnection,
        client: std::net::TcpStream,
        _root: tempfile::TempDir,
        _poll: Poll,
    }

    fn fixture() -> Fixture {
        fixture_with(|builder| builder)
    }

    fn fixture_with(configure: impl FnOnce(ServerConfigBuilder) -> ServerConfigBuilder) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        fs::set_permissions(root.path(), Permissions::from_mode(0o755)).unwrap();
        fs::write(root.path().join("index.html"), INDEX).unwrap();
        fs::set_permissions(root.path().join("index.html"), Permissions::from_mode(0o644)).unwrap();

        let poll = Poll::new().unwrap();
        let waker = Arc::new(Waker::new(poll.registry(), Token(usize::MAX)).unwrap());
        let (tx, _rx) = unbounded();
        let config = configure(ServerConfig::builder().doc_root(root.path())).build().unwrap();
        let context = Arc::new(ServerContext::new(config, tx, waker));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let client = std::net::TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let (server, peer) = listener.accept().unwrap();
        server.set_nonblocking(true).unwrap();

        let conn = HttpConnection::new(TcpStream::from_std(server), peer, Token(0), context);
        Fixture { conn, client, _root: root, _poll: poll }
    }

    fn read_exactly(conn: &mut HttpConnection, len: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while conn.read_buffer().read_index() < len {
            assert!(Instant::now() < deadline, "request did not arrive");
            conn.read().unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn write_all(conn: &mut HttpConnection) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while conn.write().unwrap() == WriteStatus::Pending {
            assert!(Instant::now() < deadline, "response was not sent");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn keep_alive_response_resets_state() {
        let Fixture { mut conn, mut client, _root, .. } = fixture();

        let request = b"GET /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";
        client.write_all(request).unwrap();
        read_exactly(&mut conn, request.len());

        assert_eq!(conn.process_request(), NextStep::Rearm(Interest::WRITABLE));
        assert!(conn.keep_alive());
        assert!(conn.has_body());

        write_all(&mut conn);
        assert!(!conn.has_body());

        let expected = [
            &b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 14\r\nConnection: keep-alive\r\n\r\n"[..],
            INDEX,
        ]
        .concat();
        let mut response = vec![0; expected.len()];
        client.read_exact(&mut response).unwrap();
        assert_eq!(response, expected);

        conn.reset();
        assert_eq!(conn.decoder().phase(), Phase::RequestLine);
        assert_eq!(conn.decoder().checked_index(), 0);
        assert_eq!(conn.decoder().start_line(), 0);
        assert_eq!(conn.read_buffer().read_index(), 0);
        assert!(!conn.keep_alive());
        assert!(!conn.has_body());
    }

    #[test]
    fn incomplete_request_waits_for_more() {
        let Fixture { mut conn, mut client, _root, .. } = fixture();

        client.write_all(b"GET /index.html HTTP/1.1\r\nHo").unwrap();
        read_exactly(&mut conn, 28);

        assert_eq!(conn.process_request(), NextStep::Rearm(Interest::READABLE));
        assert_eq!(conn.decoder().phase(), Phase::Header);

        client.write_all(b"st: x\r\n\r\n").unwrap();
        read_exactly(&mut conn, 37);
        assert_eq!(conn.process_request(), NextStep::Rearm(Interest::WRITABLE));
    }

    #[test]
    fn bad_request_gets_error_page() {
        let Fixture { mut conn, mut client, _root, .. } = fixture();

        let request = b"POST /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";
        client.write_all(request).unwrap();
        read_exactly(&mut conn, request.len());

        assert_eq!(conn.process_request(), NextStep::Rearm(Interest::WRITABLE));
        assert!(!conn.keep_alive());
        assert!(!conn.has_body());
        write_all(&mut conn);
        drop(conn);

        let mut response = String::new();
        client.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("Connection: close\r\n"));
        assert!(response.ends_with(error_page(StatusCode::BAD_REQUEST)));
    }

    #[test]
    fn missing_file_keeps_connection() {
        let Fixture { mut conn, mut client, _root, .. } = fixture();

        let request = b"GET /missing.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";
        client.write_all(request).unwrap();
        read_exactly(&mut conn, request.len());

        assert_eq!(conn.process_request(), NextStep::Rearm(Interest::WRITABLE));
        assert!(conn.keep_alive());
        write_all(&mut conn);

        let page = error_page(StatusCode::NOT_FOUND);
        let head = format!("HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: keep-alive\r\n\r\n", page.len());
        let mut response = vec![0; head.len() + page.len()];
        client.read_exact(&mut response).unwrap();
        assert_eq!(response, format!("{head}{page}").into_bytes());
    }

    #[test]
    fn head_larger_than_write_buffer_closes() {
        let Fixture { mut conn, mut client, _root, .. } = fixture_with(|builder| builder.write_buffer_size(16));

        let request = b"GET /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";
        client.write_all(request).unwrap();
        read_exactly(&mut conn, request.len());

        assert_eq!(conn.process_request(), NextStep::Close);
        assert!(!conn.has_body());
    }

    #[test]
    fn peer_close_fails_read() {
        let Fixture { mut conn, client, _root, .. } = fixture();
        drop(client);

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match conn.read() {
                Err(ConnError::PeerClosed) => break,
                Ok(_) => {
                    assert!(Instant::now() < deadline, "close was not observed");
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(e) => panic!("unexpected error {e}"),
            }
        }
    }
}
