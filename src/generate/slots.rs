//! Fixed-size request slot pool for the shared generation backend.
//!
//! Every backend request holds a slot for its duration. Callers that cannot
//! get a slot within their wait budget give up instead of queueing forever,
//! so one busy caller cannot starve the others.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
pub struct SlotPool {
    capacity: usize,
    in_use: Mutex<usize>,
    freed: Condvar,
}

impl SlotPool {
    /// A pool with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            in_use: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.capacity - *self.in_use.lock()
    }

    /// Take a slot, waiting up to `wait` for one to free up.
    ///
    /// A `wait` too large to represent as a deadline waits indefinitely.
    pub fn acquire(&self, wait: Duration) -> Option<SlotGuard<'_>> {
        let deadline = Instant::now().checked_add(wait);
        let mut in_use = self.in_use.lock();

        while *in_use >= self.capacity {
            match deadline {
                Some(deadline) => {
                    if self.freed.wait_until(&mut in_use, deadline).timed_out() {
                        if *in_use >= self.capacity {
                            return None;
                        }
                        break;
                    }
                }
                None => self.freed.wait(&mut in_use),
            }
        }

        *in_use += 1;
        Some(SlotGuard { pool: self })
    }
}

/// Holds one slot; releases it on drop.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    pool: &'a SlotPool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut in_use = self.pool.in_use.lock();
        *in_use -= 1;
        self.pool.freed.notify_one();
    }
}
