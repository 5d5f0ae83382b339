use parking_lot::{Condvar, Mutex};

/// A counting semaphore.
///
/// Waiters block on a condition variable while no permit is available, so an
/// idle worker does not consume cpu.
#[derive(Debug, Default)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self { permits: Mutex::new(permits), available: Condvar::new() }
    }

    /// Blocks until a permit is available and takes it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Adds one permit and wakes a single waiter.
    pub fn release(&self) {
        *self.permits.lock() += 1;
        self.available.notify_one();
    }

    /// Adds `n` permits and wakes every waiter.
    pub fn release_many(&self, n: usize) {
        *self.permits.lock() += n;
        self.available.notify_all();
    }
}
