//! The delayed queue: (task, deadline) pairs awaiting promotion.
//!
//! Not ordered by deadline -- the supervisor scans it linearly on every tick
//! (see the crate docs on the promotion pass). A task lives in exactly one of
//! the delayed queue or the ready queue at any instant, never both.

use std::sync::Mutex;
use std::time::Instant;

use crate::clock::Clock;
use crate::error::Error;
use crate::task::Task;

pub(crate) struct DelayedQueue {
    inner: Mutex<Vec<(Box<dyn Task>, Instant)>>,
}

impl DelayedQueue {
    pub(crate) fn new() -> Self {
        DelayedQueue {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Record a (task, deadline) pair. No ordering is maintained.
    pub(crate) fn submit(&self, task: Box<dyn Task>, deadline: Instant) {
        self.inner.lock().unwrap().push((task, deadline));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Remove and return every pair whose deadline has passed, in original
    /// insertion order (this is also the tie-break order for identical
    /// deadlines). The delayed-queue mutex is released before this returns;
    /// callers must not be holding it and must insert the returned tasks into
    /// the ready queue themselves, so that the two queues' mutexes are never
    /// nested (see the crate docs on lock ordering).
    ///
    /// If the clock read fails, the pass is aborted -- nothing is removed --
    /// and `Err` is returned so the caller can log and retry next tick.
    pub(crate) fn take_due(&self, clock: &dyn Clock) -> Result<Vec<Box<dyn Task>>, Error> {
        let now = clock.try_now()?;

        let mut guard = self.inner.lock().unwrap();
        let pending = std::mem::take(&mut *guard);

        let mut still_waiting = Vec::with_capacity(pending.len());
        let mut due = Vec::new();
        for (task, deadline) in pending {
            if deadline <= now {
                due.push(task);
            } else {
                still_waiting.push((task, deadline));
            }
        }
        *guard = still_waiting;
        Ok(due)
    }
}
