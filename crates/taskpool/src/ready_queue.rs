//! The ready queue: the ordered sequence of tasks awaiting execution.
//!
//! Protected by a single mutex, as required by the concurrency model --
//! workers and the supervisor serialize on it rather than using a lock-free
//! structure or a condvar (see the crate docs for why polling was kept).

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::Error;
use crate::task::{Priority, Task, MAX_PRIORITY, MIN_PRIORITY};

struct Entry {
    task: Box<dyn Task>,
    priority: Priority,
}

pub(crate) struct ReadyQueue {
    inner: Mutex<VecDeque<Entry>>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        ReadyQueue {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// FIFO submission: insert at the back, forcing the task's priority to
    /// [`MIN_PRIORITY`] as a side effect (see [`crate::Task::set_priority`]
    /// docs).
    pub(crate) fn push_fifo(&self, mut task: Box<dyn Task>) {
        task.set_priority(MIN_PRIORITY);
        let mut guard = self.inner.lock().unwrap();
        guard.push_back(Entry {
            task,
            priority: MIN_PRIORITY,
        });
    }

    /// LIFO submission: insert at the front, forcing the task's priority to
    /// [`MAX_PRIORITY`] as a side effect.
    pub(crate) fn push_lifo(&self, mut task: Box<dyn Task>) {
        task.set_priority(MAX_PRIORITY);
        let mut guard = self.inner.lock().unwrap();
        guard.push_front(Entry {
            task,
            priority: MAX_PRIORITY,
        });
    }

    /// PRIORITY submission: requires the task to carry the priority
    /// capability. Scans from the front and inserts before the first entry
    /// whose priority is strictly less than the new task's, else appends.
    /// Equal priorities preserve submission order (stable, non-preempting).
    pub(crate) fn insert_priority(&self, task: Box<dyn Task>) -> Result<(), Error> {
        let priority = task.priority().ok_or(Error::WrongCapability)?;
        let mut guard = self.inner.lock().unwrap();
        match guard.iter().position(|e| e.priority < priority) {
            Some(idx) => guard.insert(idx, Entry { task, priority }),
            None => guard.push_back(Entry { task, priority }),
        }
        Ok(())
    }

    /// Take the front task, if any. Never blocks beyond mutex acquisition.
    pub(crate) fn try_pop_front(&self) -> Option<Box<dyn Task>> {
        self.inner.lock().unwrap().pop_front().map(|e| e.task)
    }

    /// A snapshot count; may be stale the instant it's observed.
    pub(crate) fn size(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
