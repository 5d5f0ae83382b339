//! A fixed size thread pool consuming a bounded FIFO queue.
//!
//! Items are boxed values implementing [`Process`]. The queue is the only state
//! shared between the reactor and the workers; an item is owned by the queue
//! until a worker pops it, and by that worker until it has been processed.
//!
//! [`ThreadPool::append`] never blocks: once `max_requests` items are pending,
//! further items are handed back to the caller.

mod semaphore;

pub use semaphore::Semaphore;

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error};

/// Work executed on a pool thread.
pub trait Process: Send {
    /// Runs the item to completion.
    fn process(self: Box<Self>);
}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("invalid pool config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("failed to spawn worker thread: {source}")]
    Spawn {
        #[from]
        source: io::Error,
    },
}

struct Shared<T: ?Sized> {
    queue: Mutex<VecDeque<Box<T>>>,
    pending: Semaphore,
    stop: AtomicBool,
    max_requests: usize,
}

pub struct ThreadPool<T: Process + ?Sized + 'static> {
    shared: Arc<Shared<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Process + ?Sized + 'static> ThreadPool<T> {
    /// Starts `thread_count` workers sharing a queue of at most `max_requests` items.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if either size is zero and
    /// `PoolError::Spawn` if a worker thread cannot be created. Workers already
    /// started are stopped and joined before the error is returned.
    pub fn new(thread_count: usize, max_requests: usize) -> Result<Self, PoolError> {
        if thread_count == 0 {
            return Err(PoolError::InvalidConfig { reason: "thread count must be positive" });
        }
        if max_requests == 0 {
            return Err(PoolError::InvalidConfig { reason: "max requests must be positive" });
        }

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            pending: Semaphore::new(0),
            stop: AtomicBool::new(false),
            max_requests,
        });

        let mut pool = Self { shared, workers: Vec::with_capacity(thread_count) };
        for id in 0..thread_count {
            let shared = pool.shared.clone();
            let handle = thread::Builder::new().name(format!("micro-static-worker-{id}")).spawn(move || worker_loop(&shared))?;
            pool.workers.push(handle);
        }

        debug!(thread_count, max_requests, "thread pool started");
        Ok(pool)
    }

    /// Queues `item` for processing.
    ///
    /// # Errors
    ///
    /// Hands `item` back if `max_requests` items are already pending.
    pub fn append(&self, item: Box<T>) -> Result<(), Box<T>> {
        {
            let mut queue = self.shared.queue.lock();
            if queue.len() >= self.shared.max_requests {
                return Err(item);
            }
            queue.push_back(item);
        }

        self.shared.pending.release();
        Ok(())
    }

    /// Number of items waiting for a worker.
    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    pub fn max_requests(&self) -> usize {
        self.shared.max_requests
    }
}

impl<T: Process + ?Sized + 'static> fmt::Debug for ThreadPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("thread_count", &self.workers.len())
            .field("max_requests", &self.shared.max_requests)
            .finish_non_exhaustive()
    }
}

impl<T: Process + ?Sized + 'static> Drop for ThreadPool<T> {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.pending.release_many(self.workers.len());

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

fn worker_loop<T: Process + ?Sized>(shared: &Shared<T>) {
    loop {
        shared.pending.acquire();
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        let item = shared.queue.lock().pop_front();
        if let Some(item) = item {
            item.process();
        }
    }
}
