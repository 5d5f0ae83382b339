//! The event loop owning every socket.
//!
//! The reactor accepts connections, reads requests and writes responses on its
//! own thread; decoding and response building run on the [`ThreadPool`].
//!
//! A connection lives in the reactor's slab while the reactor owns it. Once its
//! request bytes have been read it is moved into the pool, leaving its slot
//! marked busy, and events for a busy slot are ignored. The worker sends it
//! back through a channel together with the interest to register next, and only
//! the reactor re-registers it. A socket is therefore armed only while the
//! reactor holds its connection.

mod context;

pub use context::{ServerContext, ShutdownHandle};

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use slab::Slab;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::config::ServerConfig;
use crate::connection::{Handoff, HttpConnection, NextStep, WriteStatus};
use crate::pool::ThreadPool;

const LISTENER: Token = Token(usize::MAX);
const WAKER: Token = Token(usize::MAX - 1);

#[derive(Error, Debug)]
pub enum ReactorError {
    #[error("failed to create poll: {source}")]
    Create { source: io::Error },

    #[error("failed to register listener: {source}")]
    Register { source: io::Error },

    #[error("failed to wait for events: {source}")]
    Poll { source: io::Error },
}

enum Slot {
    Idle(Box<HttpConnection>),
    Busy,
}

pub struct Reactor {
    pool: ThreadPool<HttpConnection>,
    poll: Poll,
    listener: TcpListener,
    connections: Slab<Slot>,
    context: Arc<ServerContext>,
    completions: Receiver<Handoff>,
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl Reactor {
    /// Creates the reactor for `listener`, handing requests to `pool`.
    ///
    /// # Errors
    ///
    /// Fails if the poll instance or its waker cannot be created, or the
    /// listener cannot be registered.
    pub fn new(mut listener: TcpListener, config: ServerConfig, pool: ThreadPool<HttpConnection>) -> Result<Self, ReactorError> {
        let poll = Poll::new().map_err(|source| ReactorError::Create { source })?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER).map_err(|source| ReactorError::Create { source })?);

        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(|source| ReactorError::Register { source })?;

        let (sender, completions) = unbounded();
        let context = Arc::new(ServerContext::new(config, sender, waker.clone()));

        Ok(Self {
            pool,
            poll,
            listener,
            connections: Slab::new(),
            context,
            completions,
            stop: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.stop.clone(), self.waker.clone())
    }

    /// Runs the event loop until a shutdown is requested.
    ///
    /// # Errors
    ///
    /// Returns `ReactorError::Poll` if waiting for events fails for any reason
    /// other than an interrupt.
    pub fn run(&mut self) -> Result<(), ReactorError> {
        let mut events = Events::with_capacity(self.context.config().max_events());
        info!(addr = ?self.listener.local_addr().ok(), threads = self.pool.thread_count(), "reactor started");

        while !self.stop.load(Ordering::Acquire) {
            self.turn(&mut events, None)?;
        }

        info!(active = self.context.active_connections(), "reactor shutdown");
        Ok(())
    }

    /// Waits for one batch of events and handles it.
    ///
    /// Connection events are handled first. Returned connections are re-armed
    /// and new ones accepted only after the batch, so no event of the batch
    /// reaches a connection re-armed or a slab key reused while handling it.
    fn turn(&mut self, events: &mut Events, timeout: Option<Duration>) -> Result<(), ReactorError> {
        if let Err(e) = self.poll.poll(events, timeout) {
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            error!(cause = %e, "poll failed, reactor stopped");
            return Err(ReactorError::Poll { source: e });
        }

        let mut woken = false;
        let mut acceptable = false;
        for event in events.iter() {
            match event.token() {
                LISTENER => acceptable = true,
                WAKER => woken = true,
                token => self.handle_event(token, event),
            }
        }

        if woken {
            self.drain_completions();
        }
        if acceptable {
            self.accept();
        }
        Ok(())
    }

    fn accept(&mut self) {
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    return;
                }
            };

            if self.context.active_connections() >= self.context.config().max_connections() {
                warn!(peer = %peer, "too many connections, rejected");
                continue;
            }

            let entry = self.connections.vacant_entry();
            let token = Token(entry.key());
            let mut conn = Box::new(HttpConnection::new(stream, peer, token, self.context.clone()));
            if let Err(e) = conn.register(self.poll.registry(), Interest::READABLE) {
                error!(peer = %peer, cause = %e, "failed to register connection");
                continue;
            }

            entry.insert(Slot::Idle(conn));
            self.context.connection_opened();
            debug!(peer = %peer, token = token.0, "connection accepted");
        }
    }

    fn handle_event(&mut self, token: Token, event: &Event) {
        let Some(mut conn) = self.take(token) else {
            trace!(token = token.0, "event for busy or closed connection ignored");
            return;
        };

        if event.is_error() || event.is_read_closed() || event.is_write_closed() {
            debug!(peer = %conn.peer(), "connection hang up");
            self.close(conn);
            return;
        }

        let interest = conn.interest();
        if interest.is_readable() && event.is_readable() {
            match conn.read() {
                Ok(_) => self.dispatch(conn),
                Err(e) => {
                    debug!(peer = %conn.peer(), cause = %e, "read failed");
                    self.close(conn);
                }
            }
        } else if interest.is_writable() && event.is_writable() {
            match conn.write() {
                Ok(WriteStatus::Pending) => self.rearm(conn, Interest::WRITABLE),
                Ok(WriteStatus::Done) if conn.keep_alive() => {
                    conn.reset();
                    self.rearm(conn, Interest::READABLE);
                }
                Ok(WriteStatus::Done) => self.close(conn),
                Err(e) => {
                    debug!(peer = %conn.peer(), cause = %e, "write failed");
                    self.close(conn);
                }
            }
        } else {
            self.restore(conn);
        }
    }

    fn dispatch(&mut self, conn: Box<HttpConnection>) {
        if let Err(conn) = self.pool.append(conn) {
            warn!(peer = %conn.peer(), max_requests = self.pool.max_requests(), "request queue is full, connection closed");
            self.close(conn);
        }
    }

    fn drain_completions(&mut self) {
        while let Ok(Handoff { conn, next }) = self.completions.try_recv() {
            match next {
                NextStep::Rearm(interest) => self.rearm(conn, interest),
                NextStep::Close => self.close(conn),
            }
        }
    }

    /// Takes an idle connection out of its slot, leaving the slot busy.
    fn take(&mut self, token: Token) -> Option<Box<HttpConnection>> {
        let slot = self.connections.get_mut(token.0)?;
        match std::mem::replace(slot, Slot::Busy) {
            Slot::Idle(conn) => Some(conn),
            Slot::Busy => None,
        }
    }

    fn restore(&mut self, conn: Box<HttpConnection>) {
        if let Some(slot) = self.connections.get_mut(conn.token().0) {
            *slot = Slot::Idle(conn);
        }
    }

    fn rearm(&mut self, mut conn: Box<HttpConnection>, interest: Interest) {
        if let Err(e) = conn.rearm(self.poll.registry(), interest) {
            error!(peer = %conn.peer(), cause = %e, "failed to rearm connection");
            self.close(conn);
            return;
        }
        self.restore(conn);
    }

    fn close(&mut self, mut conn: Box<HttpConnection>) {
        if let Err(e) = conn.deregister(self.poll.registry()) {
            debug!(peer = %conn.peer(), cause = %e, "failed to deregister connection");
        }

        if self.connections.try_remove(conn.token().0).is_some() {
            self.context.connection_closed();
        }
        debug!(peer = %conn.peer(), "connection closed");
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("pool", &self.pool)
            .field("connections", &self.connections.len())
            .field("active", &self.context.active_connections())
            .finish_non_exhaustive()
    }
}
