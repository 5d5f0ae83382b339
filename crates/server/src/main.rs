use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mio::net::TcpListener;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use micro_static::config::{DEFAULT_MAX_CONNECTIONS, ServerConfig};
use micro_static::fs::BufferedLoader;
use micro_static::pool::ThreadPool;
use micro_static::reactor::Reactor;

/// Serves the files below a document root over HTTP/1.1.
#[derive(Parser, Debug)]
#[command(name = "micro-static", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(env = "MICRO_STATIC_PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, env = "MICRO_STATIC_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Directory the request urls resolve under
    #[arg(long, env = "MICRO_STATIC_ROOT", default_value = "/var/www/html")]
    root: PathBuf,

    /// Number of worker threads
    #[arg(long, env = "MICRO_STATIC_THREADS", default_value_t = 8)]
    threads: usize,

    /// Requests allowed to wait for a worker
    #[arg(long, env = "MICRO_STATIC_QUEUE_DEPTH", default_value_t = 10000)]
    queue_depth: usize,

    /// Simultaneous connections, extra ones are closed on accept
    #[arg(long, env = "MICRO_STATIC_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Read files into memory instead of mapping them
    #[arg(long, env = "MICRO_STATIC_BUFFERED")]
    buffered: bool,

    /// Maximum level of the log output
    #[arg(long, env = "MICRO_STATIC_LOG_LEVEL", default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let doc_root = cli.root.canonicalize().with_context(|| format!("can't resolve document root {}", cli.root.display()))?;

    let mut builder = ServerConfig::builder().doc_root(&doc_root).max_connections(cli.max_connections);
    if cli.buffered {
        builder = builder.loader(BufferedLoader);
    }
    let config = builder.build()?;
    let pool = ThreadPool::new(cli.threads, cli.queue_depth)?;

    let addr = SocketAddr::new(cli.host, cli.port);
    let listener = match TcpListener::bind(addr) {
        Ok(listener) => listener,
        Err(e) => {
            error!(cause = %e, %addr, "bind server error");
            return Err(e.into());
        }
    };

    info!(%addr, root = %doc_root.display(), threads = cli.threads, "start listening");
    let mut reactor = Reactor::new(listener, config, pool)?;
    reactor.run()?;
    Ok(())
}
