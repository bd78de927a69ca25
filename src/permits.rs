use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// Counting semaphore guarding checkout permission.
///
/// The count mirrors the number of objects a caller may take from the
/// pool's storage. It says nothing about the storage itself: the pool must
/// store an object before calling [`Permits::add`] for it.
#[derive(Debug)]
pub(crate) struct Permits {
    count: Mutex<usize>,
    available: Condvar,
}

impl Permits {
    pub(crate) fn new(count: usize) -> Self {
        Permits {
            count: Mutex::new(count),
            available: Condvar::new(),
        }
    }

    /// Takes a permit if one is free.
    pub(crate) fn try_take(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Takes a permit, waiting as long as it takes.
    pub(crate) fn take(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Takes a permit, waiting no later than `deadline`.
    ///
    /// Returns `false` if the deadline passed first.
    pub(crate) fn take_until(&self, deadline: Instant) -> bool {
        let mut count = self.count.lock();
        while *count == 0 {
            if self.available.wait_until(&mut count, deadline).timed_out() {
                // A permit may have landed together with the timeout.
                break;
            }
        }
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Publishes one permit and wakes a single waiter.
    pub(crate) fn add(&self) {
        let mut count = self.count.lock();
        *count += 1;
        drop(count);
        self.available.notify_one();
    }
}
