//! The public facade: submission, configuration, and lifecycle control.
//!
//! `Pool` owns the ready queue, the delayed queue, the worker collection, and
//! the supervisor; it is the only type most callers ever touch directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::config::{Watermarks, MAX_WORKERS, SUPERVISOR_TICK_US, WORKER_IDLE_SLEEP_US};
use crate::delayed_queue::DelayedQueue;
use crate::error::Result;
use crate::logging::{pool_info, pool_warn, DefaultLogger, PoolLogger};
use crate::ready_queue::ReadyQueue;
use crate::supervisor::{self, SupervisorState};
use crate::task::Task;
use crate::worker;

const LOG_CATEGORY: &str = "taskpool::pool";

/// How a task is placed into the ready queue (see the crate docs on
/// submission ordering semantics).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum SubmitMode {
    /// Insert at the back; forces the task's priority to the minimum.
    Fifo,
    /// Insert at the front; forces the task's priority to the maximum.
    Lifo,
    /// Insert before the first queued task with a strictly lower priority.
    /// Requires the task to report `Some` priority.
    #[default]
    Priority,
}

/// Constructs a [`Pool`] with non-default watermarks, tick interval,
/// worker idle sleep, logger, or clock.
pub struct PoolBuilder {
    low: u8,
    high: u8,
    ceiling: u8,
    tick: Duration,
    worker_idle_sleep: Duration,
    logger: Arc<dyn PoolLogger>,
    clock: Arc<dyn Clock>,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        PoolBuilder {
            low: 1,
            high: 1,
            ceiling: MAX_WORKERS,
            tick: Duration::from_micros(SUPERVISOR_TICK_US),
            worker_idle_sleep: Duration::from_micros(WORKER_IDLE_SLEEP_US),
            logger: Arc::new(DefaultLogger),
            clock: Arc::new(SystemClock),
        }
    }
}

impl PoolBuilder {
    pub fn new() -> Self {
        PoolBuilder::default()
    }

    /// The minimum worker count maintained unconditionally. Clamped at
    /// construction time the same way [`Pool::set_low`] clamps it at
    /// runtime.
    pub fn low_watermark(mut self, low: u8) -> Self {
        self.low = low;
        self
    }

    /// The ceiling the supervisor scales up to under load. Clamped to
    /// `ceiling` at construction time.
    pub fn high_watermark(mut self, high: u8) -> Self {
        self.high = high;
        self
    }

    /// Narrow the per-instance absolute ceiling below [`MAX_WORKERS`].
    /// Widening past [`MAX_WORKERS`] is not possible.
    pub fn worker_ceiling(mut self, ceiling: u8) -> Self {
        self.ceiling = ceiling.min(MAX_WORKERS);
        self
    }

    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn worker_idle_sleep(mut self, sleep: Duration) -> Self {
        self.worker_idle_sleep = sleep;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn PoolLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the pool. A single worker is spawned immediately (construction
    /// always produces a live worker); the supervisor itself does not start
    /// until [`Pool::start`] is called.
    pub fn build(self) -> Pool {
        let ready_queue = Arc::new(ReadyQueue::new());
        let watermarks = Watermarks::new(self.low, self.high, self.ceiling);

        let state = Arc::new(SupervisorState {
            ready_queue: ready_queue.clone(),
            delayed_queue: Arc::new(DelayedQueue::new()),
            workers: DashMap::new(),
            watermarks,
            clock: self.clock,
            logger: self.logger.clone(),
            tick: self.tick,
            worker_idle_sleep: self.worker_idle_sleep,
        });

        match worker::spawn(ready_queue, state.logger.clone(), state.worker_idle_sleep) {
            Ok(handle) => {
                state.workers.insert(handle.id(), handle);
            }
            Err(err) => {
                pool_warn!(state.logger, LOG_CATEGORY, "absorbing initial worker spawn failure: {err}");
                #[cfg(test)]
                crate::error::test_support::record(&err);
            }
        }

        Pool {
            state,
            supervisor_stop: Arc::new(AtomicBool::new(false)),
            supervisor_thread: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }
}

/// A scaling in-process worker pool for plain, priority, and deadline-delayed
/// tasks.
///
/// Construction spawns exactly one worker; the supervisor (which handles
/// scaling and delayed-task promotion) does not run until [`Pool::start`] is
/// called.
pub struct Pool {
    state: Arc<SupervisorState>,
    supervisor_stop: Arc<AtomicBool>,
    supervisor_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    started: AtomicBool,
}

impl Default for Pool {
    fn default() -> Self {
        PoolBuilder::default().build()
    }
}

impl Pool {
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    pub fn new() -> Self {
        Pool::default()
    }

    /// Start the supervisor thread. Idempotent: calling this more than once
    /// has no additional effect.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let weak = Arc::downgrade(&self.state);
        let stop = self.supervisor_stop.clone();
        let logger = self.state.logger.clone();
        let handle = std::thread::Builder::new()
            .name("taskpool-supervisor".into())
            .spawn(move || supervisor::run(weak, stop, logger))
            .expect("failed to spawn supervisor thread");
        *self.supervisor_thread.lock().unwrap() = Some(handle);
    }

    /// Submit a task under the given mode.
    pub fn submit(&self, task: Box<dyn Task>, mode: SubmitMode) -> Result<()> {
        match mode {
            SubmitMode::Fifo => {
                self.state.ready_queue.push_fifo(task);
                Ok(())
            }
            SubmitMode::Lifo => {
                self.state.ready_queue.push_lifo(task);
                Ok(())
            }
            SubmitMode::Priority => self.state.ready_queue.insert_priority(task),
        }
    }

    /// Equivalent to `submit(task, SubmitMode::Priority)`.
    pub fn submit_priority(&self, task: Box<dyn Task>) -> Result<()> {
        self.submit(task, SubmitMode::Priority)
    }

    /// Record a task to be promoted into the ready queue once `deadline` has
    /// passed. Never fails; the deadline is an absolute [`Instant`].
    pub fn submit_delayed(&self, task: Box<dyn Task>, deadline: Instant) {
        self.state.delayed_queue.submit(task, deadline);
    }

    pub fn worker_count(&self) -> usize {
        self.state.worker_count()
    }

    pub fn queue_size(&self) -> usize {
        self.state.ready_queue.size()
    }

    pub fn low_watermark(&self) -> u8 {
        self.state.watermarks.low()
    }

    pub fn high_watermark(&self) -> u8 {
        self.state.watermarks.high()
    }

    /// Clamped silently to not exceed the current high watermark.
    pub fn set_low(&self, low: u8) {
        self.state.watermarks.set_low(low);
    }

    /// Clamped silently to `[low + 1, ceiling]`.
    pub fn set_high(&self, high: u8) {
        self.state.watermarks.set_high(high);
    }

    /// Stop the supervisor, then retire and join every worker in turn. All
    /// tasks still queued at this point are dropped without running.
    /// Idempotent-ish: calling this more than once is harmless, the second
    /// call simply finds nothing left to stop.
    pub fn shutdown(&self) {
        self.supervisor_stop.store(true, Ordering::Release);
        if let Some(handle) = self.supervisor_thread.lock().unwrap().take() {
            let _ = handle.join();
        }

        let ids: Vec<_> = self.state.workers.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some(mut handle) = self.state.workers.get_mut(&id) {
                handle.signal_stop();
                handle.join();
            }
            self.state.workers.remove(&id);
        }

        pool_info!(self.state.logger, LOG_CATEGORY, "pool shut down");
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
