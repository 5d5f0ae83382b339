use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_channel::Sender;
use mio::Waker;
use tracing::{debug, error};

use crate::config::ServerConfig;
use crate::connection::Handoff;
use crate::fs::Resolver;

/// State shared by the reactor and every connection.
#[derive(Debug)]
pub struct ServerContext {
    config: ServerConfig,
    resolver: Resolver,
    active: AtomicUsize,
    completions: Sender<Handoff>,
    waker: Arc<Waker>,
}

impl ServerContext {
    pub(crate) fn new(config: ServerConfig, completions: Sender<Handoff>, waker: Arc<Waker>) -> Self {
        let resolver = config.resolver();
        Self { config, resolver, active: AtomicUsize::new(0), completions, waker }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Number of connections currently open.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn connection_opened(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn connection_closed(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }

    /// Returns a connection to the reactor and wakes it up.
    pub(crate) fn complete(&self, handoff: Handoff) {
        if let Err(e) = self.completions.send(handoff) {
            // the reactor is gone, dropping the connection closes the socket
            debug!(peer = %e.into_inner().conn.peer(), "reactor stopped, connection dropped");
            return;
        }

        if let Err(e) = self.waker.wake() {
            error!(cause = %e, "failed to wake reactor");
        }
    }
}

/// Stops a running [`Reactor`](crate::reactor::Reactor) from any thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub(crate) fn new(stop: Arc<AtomicBool>, waker: Arc<Waker>) -> Self {
        Self { stop, waker }
    }

    /// Asks the event loop to return; connections still open are closed when the reactor is dropped.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
        if let Err(e) = self.waker.wake() {
            error!(cause = %e, "failed to wake reactor for shutdown");
        }
    }
}
