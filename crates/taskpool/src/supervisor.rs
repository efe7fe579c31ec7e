//! The periodic control loop: resizes the worker population and promotes due
//! delayed tasks.
//!
//! Grounded on the original `ThreadPool::scheduler()`'s three-phase tick
//! (autocreate-to-low, on-demand spawn, idle retirement, then delayed
//! promotion) and on this codebase's own scheduling-thread pattern of
//! spawning a background thread that holds only a [`Weak`] reference to its
//! owner and exits once that owner is gone, rather than a dedicated stop
//! flag.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::Clock;
use crate::config::Watermarks;
use crate::delayed_queue::DelayedQueue;
use crate::logging::{pool_debug, pool_info, pool_warn, PoolLogger};
use crate::ready_queue::ReadyQueue;
use crate::unique_id::WorkerId;
use crate::worker::{self, WorkerHandle, WorkerStatus};

const LOG_CATEGORY: &str = "taskpool::supervisor";

/// Everything the supervisor needs read/write access to. Owned by the pool
/// facade; the supervisor thread holds only a [`Weak`] reference so the pool
/// can be torn down without a separate stop signal racing thread spawn.
pub(crate) struct SupervisorState {
    pub(crate) ready_queue: Arc<ReadyQueue>,
    pub(crate) delayed_queue: Arc<DelayedQueue>,
    pub(crate) workers: DashMap<WorkerId, WorkerHandle>,
    pub(crate) watermarks: Watermarks,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) logger: Arc<dyn PoolLogger>,
    pub(crate) tick: Duration,
    pub(crate) worker_idle_sleep: Duration,
}

impl SupervisorState {
    /// Current worker count. Does not require the ready queue mutex; the
    /// worker collection is its own concurrent map.
    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn try_spawn_worker(&self) -> bool {
        match worker::spawn(
            self.ready_queue.clone(),
            self.logger.clone(),
            self.worker_idle_sleep,
        ) {
            Ok(handle) => {
                let id = handle.id();
                self.workers.insert(id, handle);
                pool_info!(self.logger, LOG_CATEGORY, "spawned worker {id:?}");
                true
            }
            Err(err) => {
                pool_warn!(self.logger, LOG_CATEGORY, "absorbing worker spawn failure, will retry next tick: {err}");
                #[cfg(test)]
                crate::error::test_support::record(&err);
                false
            }
        }
    }

    /// One idle worker, if any, chosen arbitrarily (the collection is
    /// unordered by design, see the crate docs on worker ownership).
    fn find_idle_worker(&self) -> Option<WorkerId> {
        self.workers
            .iter()
            .find(|entry| entry.value().status() == WorkerStatus::Idle)
            .map(|entry| *entry.key())
    }

    /// Signal, join, and remove exactly one worker, in that literal order
    /// (see the crate docs' "worker retirement race" note): the handle is
    /// joined while it is still in the collection, and only removed once the
    /// thread has actually exited.
    fn retire(&self, id: WorkerId) {
        if let Some(mut handle) = self.workers.get_mut(&id) {
            handle.signal_stop();
            handle.join();
        } else {
            return;
        }
        self.workers.remove(&id);
        pool_info!(self.logger, LOG_CATEGORY, "retired worker {id:?}");
    }

    /// Phase (a): scale the worker population.
    fn scale(&self) {
        let low = self.watermarks.low() as usize;
        let high = self.watermarks.high() as usize;

        while self.worker_count() < low {
            if !self.try_spawn_worker() {
                break;
            }
        }

        if self.ready_queue.size() > self.watermarks.max_queue_size() && self.worker_count() < high {
            if self.try_spawn_worker() {
                self.watermarks.on_demand_spawn();
            }
        }

        if self.ready_queue.size() == 0 && self.worker_count() > low {
            if let Some(id) = self.find_idle_worker() {
                self.retire(id);
                self.watermarks.on_retirement();
            }
        }
    }

    /// Phase (b): move due delayed tasks into the ready queue. A task that
    /// fails the priority-path promotion (no priority capability) still gets
    /// dispatched -- it falls back to FIFO placement rather than being
    /// dropped, since a promoted task is never discarded for lacking a
    /// capability it was never required to have outside this path.
    fn promote_due(&self) {
        match self.delayed_queue.take_due(self.clock.as_ref()) {
            Ok(due) => {
                for task in due {
                    if task.priority().is_some() {
                        let _ = self.ready_queue.insert_priority(task);
                    } else {
                        pool_debug!(
                            self.logger,
                            LOG_CATEGORY,
                            "promoted task lacks priority capability, falling back to FIFO placement"
                        );
                        self.ready_queue.push_fifo(task);
                    }
                }
            }
            Err(err) => {
                pool_warn!(self.logger, LOG_CATEGORY, "delayed queue promotion pass aborted, will retry next tick: {err}");
                #[cfg(test)]
                crate::error::test_support::record(&err);
            }
        }
    }

    fn tick_once(&self) {
        self.scale();
        self.promote_due();
    }
}

/// Background loop. Runs until `state` can no longer be upgraded, i.e. the
/// pool facade (and every other strong reference) has been dropped, or until
/// `stop` is observed set. `logger` is captured up front so the exit message
/// can still be emitted after the last strong reference to `state` is gone.
pub(crate) fn run(state: Weak<SupervisorState>, stop: Arc<std::sync::atomic::AtomicBool>, logger: Arc<dyn PoolLogger>) {
    pool_info!(logger, LOG_CATEGORY, "supervisor starting");

    while let Some(state) = state.upgrade() {
        if stop.load(Ordering::Acquire) {
            break;
        }
        state.tick_once();
        let tick = state.tick;
        drop(state);
        std::thread::sleep(tick);
    }

    pool_info!(logger, LOG_CATEGORY, "supervisor exiting");
}
