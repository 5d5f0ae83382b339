use std::fs::{self, File, Permissions};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use micro_static::codec::error_page;
use micro_static::config::ServerConfig;
use micro_static::fs::{BufferedLoader, FileBody, FileLoader, MmapLoader};
use micro_static::pool::ThreadPool;
use micro_static::reactor::{Reactor, ReactorError, ServerContext, ShutdownHandle};

use http::StatusCode;
use mio::net::TcpListener;
use std::sync::Arc;
use tempfile::TempDir;

const INDEX: &str = "<html><body>hello</body></html>";

struct Server {
    addr: SocketAddr,
    context: Arc<ServerContext>,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<Result<(), ReactorError>>>,
    _root: TempDir,
}

impl Server {
    fn start() -> Self {
        Self::start_with(MmapLoader, 10000)
    }

    fn start_with(loader: impl FileLoader + 'static, max_connections: usize) -> Self {
        let root = doc_root();
        let config = ServerConfig::builder().doc_root(root.path()).loader(loader).max_connections(max_connections).build().unwrap();
        let pool = ThreadPool::new(4, 1000).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();

        let mut reactor = Reactor::new(listener, config, pool).unwrap();
        let addr = reactor.local_addr().unwrap();
        let context = reactor.context().clone();
        let shutdown = reactor.shutdown_handle();
        let handle = thread::spawn(move || reactor.run());

        Server { addr, context, shutdown, handle: Some(handle), _root: root }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream
    }

    fn wait_for_active(&self, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.context.active_connections() != expected {
            assert!(Instant::now() < deadline, "active connections stuck at {}", self.context.active_connections());
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let result = handle.join().unwrap();
            if !thread::panicking() {
                assert!(result.is_ok());
            }
        }
    }
}

fn doc_root() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let readable = Permissions::from_mode(0o644);

    fs::set_permissions(root.path(), Permissions::from_mode(0o755)).unwrap();
    write_file(root.path(), "index.html", INDEX.as_bytes(), readable.clone());
    write_file(root.path(), "empty.html", b"", readable.clone());
    write_file(root.path(), "large.bin", &large_body(), readable);
    write_file(root.path(), "secret.html", b"secret", Permissions::from_mode(0o600));
    fs::create_dir(root.path().join("docs")).unwrap();
    fs::set_permissions(root.path().join("docs"), Permissions::from_mode(0o755)).unwrap();
    root
}

fn write_file(root: &Path, name: &str, content: &[u8], permissions: Permissions) {
    let path = root.join(name);
    fs::write(&path, content).unwrap();
    fs::set_permissions(&path, permissions).unwrap();
}

fn large_body() -> Vec<u8> {
    (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect()
}

struct Response {
    head: String,
    body: Vec<u8>,
}

impl Response {
    fn status_line(&self) -> &str {
        self.head.lines().next().unwrap()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then_some(value.trim())
        })
    }
}

fn read_response(stream: &mut TcpStream) -> Response {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).unwrap();
        head.push(byte[0]);
    }

    let head = String::from_utf8(head).unwrap();
    let mut response = Response { head, body: Vec::new() };
    let length: usize = response.header("Content-Length").unwrap().parse().unwrap();
    response.body = vec![0; length];
    stream.read_exact(&mut response.body).unwrap();
    response
}

fn get(server: &Server, path: &str) -> Response {
    let mut stream = server.connect();
    write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
    read_response(&mut stream)
}

fn assert_closed(stream: &mut TcpStream) {
    let mut rest = Vec::new();
    assert_eq!(stream.read_to_end(&mut rest).unwrap(), 0);
}

#[test]
fn serves_file() {
    let server = Server::start();
    let response = get(&server, "/index.html");

    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(response.header("Connection"), Some("close"));
    assert_eq!(response.body, INDEX.as_bytes());
}

#[test]
fn serves_large_file_across_partial_writes() {
    let server = Server::start();
    let response = get(&server, "/large.bin");

    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(response.body, large_body());
}

#[test]
fn serves_empty_file() {
    let server = Server::start();
    let response = get(&server, "/empty.html");

    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn buffered_loader_serves_same_bytes() {
    let server = Server::start_with(BufferedLoader, 10000);
    assert_eq!(get(&server, "/index.html").body, INDEX.as_bytes());
    assert_eq!(get(&server, "/large.bin").body, large_body());
}

#[test]
fn error_statuses() {
    let server = Server::start();

    let cases = [
        ("/missing.html", "HTTP/1.1 404 Not Found", StatusCode::NOT_FOUND),
        ("/secret.html", "HTTP/1.1 403 Forbidden", StatusCode::FORBIDDEN),
        ("/docs", "HTTP/1.1 400 Bad Request", StatusCode::BAD_REQUEST),
        ("/../etc/passwd", "HTTP/1.1 400 Bad Request", StatusCode::BAD_REQUEST),
    ];

    for (path, status_line, status) in cases {
        let response = get(&server, path);
        assert_eq!(response.status_line(), status_line, "{path}");
        assert_eq!(response.body, error_page(status).as_bytes(), "{path}");
    }
}

#[derive(Debug)]
struct FailingLoader;

impl FileLoader for FailingLoader {
    fn load(&self, _file: File, _len: u64) -> io::Result<FileBody> {
        Err(io::Error::other("device went away"))
    }
}

#[test]
fn unloadable_file_gets_500() {
    let server = Server::start_with(FailingLoader, 10000);
    let mut stream = server.connect();
    stream.write_all(b"GET /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").unwrap();

    let response = read_response(&mut stream);
    assert_eq!(response.status_line(), "HTTP/1.1 500 Internal Server Error");
    assert_eq!(response.header("Connection"), Some("keep-alive"));
    assert_eq!(response.body, error_page(StatusCode::INTERNAL_SERVER_ERROR).as_bytes());
}

#[test]
fn absolute_url_is_accepted() {
    let server = Server::start();
    let response = get(&server, "http://localhost:8080/index.html");
    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(response.body, INDEX.as_bytes());
}

#[test]
fn malformed_request_gets_400_and_close() {
    let server = Server::start();
    let mut stream = server.connect();
    stream.write_all(b"DELETE /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").unwrap();

    let response = read_response(&mut stream);
    assert_eq!(response.status_line(), "HTTP/1.1 400 Bad Request");
    assert_eq!(response.header("Connection"), Some("close"));
    assert_closed(&mut stream);
}

#[test]
fn keep_alive_serves_several_requests() {
    let server = Server::start();
    let mut stream = server.connect();

    for path in ["/index.html", "/missing.html", "/index.html"] {
        write!(stream, "GET {path} HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").unwrap();
        let response = read_response(&mut stream);
        assert_eq!(response.header("Connection"), Some("keep-alive"));
    }

    stream.write_all(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();
    let response = read_response(&mut stream);
    assert_eq!(response.header("Connection"), Some("close"));
    assert_eq!(response.body, INDEX.as_bytes());
    assert_closed(&mut stream);
}

#[test]
fn request_split_across_segments() {
    let server = Server::start();
    let mut stream = server.connect();
    stream.set_nodelay(true).unwrap();

    for part in ["GE", "T /index.html HTTP/1.1\r", "\nHost: local", "host\r\n", "\r\n"] {
        stream.write_all(part.as_bytes()).unwrap();
        thread::sleep(Duration::from_millis(20));
    }

    let response = read_response(&mut stream);
    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(response.body, INDEX.as_bytes());
}

#[test]
fn request_with_body() {
    let server = Server::start();
    let mut stream = server.connect();

    stream.write_all(b"GET /index.html HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel").unwrap();
    thread::sleep(Duration::from_millis(50));
    stream.write_all(b"lo").unwrap();

    let response = read_response(&mut stream);
    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
}

#[test]
fn connections_are_counted() {
    let server = Server::start();

    let first = server.connect();
    let second = server.connect();
    server.wait_for_active(2);

    drop(first);
    drop(second);
    server.wait_for_active(0);
}

#[test]
fn connections_beyond_limit_are_closed() {
    let server = Server::start_with(MmapLoader, 1);

    let mut first = server.connect();
    server.wait_for_active(1);

    let mut second = server.connect();
    assert_closed(&mut second);

    first.write_all(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(read_response(&mut first).body, INDEX.as_bytes());
}
