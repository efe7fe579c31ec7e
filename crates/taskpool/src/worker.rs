//! A long-lived executor that repeatedly claims the front task and runs it.
//!
//! The main loop follows `WorkerThreadInt::thread_function`: yield, lock,
//! check the run flag, pop-or-idle, run, sleep. One OS thread is spawned per
//! worker (rather than a `rayon`-pool-of-anonymous-threads model) so each
//! worker has an individually observable status.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::utils::Backoff;

use crate::logging::{pool_debug, pool_error, PoolLogger};
use crate::ready_queue::ReadyQueue;
use crate::unique_id::WorkerId;

const LOG_CATEGORY: &str = "taskpool::worker";

/// A worker's observable lifecycle state (see the crate docs' state
/// machine). `Idle` <-> `Running` while the run flag is set; `Finished` is
/// terminal and reached exactly once.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum WorkerStatus {
    Idle = 0,
    Running = 1,
    Finished = 2,
}

impl WorkerStatus {
    fn from_u8(v: u8) -> WorkerStatus {
        match v {
            0 => WorkerStatus::Idle,
            1 => WorkerStatus::Running,
            _ => WorkerStatus::Finished,
        }
    }
}

struct StatusCell(AtomicU8);

impl StatusCell {
    fn new(initial: WorkerStatus) -> Self {
        StatusCell(AtomicU8::new(initial as u8))
    }

    fn load(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, status: WorkerStatus) {
        self.0.store(status as u8, Ordering::Release);
    }
}

/// Everything the pool needs to observe and retire one worker.
pub(crate) struct WorkerHandle {
    id: WorkerId,
    run_flag: Arc<AtomicBool>,
    status: Arc<StatusCell>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn id(&self) -> WorkerId {
        self.id
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        self.status.load()
    }

    /// Signal the run flag false. Advisory: the worker notices on its next
    /// mutex acquisition, not immediately.
    pub(crate) fn signal_stop(&self) {
        self.run_flag.store(false, Ordering::Release);
    }

    /// Join the executor thread. Must be called with no pool mutex held by
    /// the caller (the worker's own loop acquires the ready queue mutex right
    /// before it would observe the stop signal).
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Retirement is expected to join explicitly; this is a backstop so a
        // handle dropped some other way (e.g. a panic unwinding through the
        // worker collection) doesn't leak a detached thread silently.
        self.join();
    }
}

/// Spawn one worker thread bound to `queue`, returning a handle the
/// supervisor uses to observe and retire it.
///
/// Returns [`crate::Error::ResourceExhausted`] if the underlying OS thread
/// spawn fails; the caller treats this as non-fatal and retries on a later
/// tick.
pub(crate) fn spawn(
    queue: Arc<ReadyQueue>,
    logger: Arc<dyn PoolLogger>,
    idle_sleep: Duration,
) -> crate::error::Result<WorkerHandle> {
    let id = WorkerId::new();
    let run_flag = Arc::new(AtomicBool::new(true));
    let status = Arc::new(StatusCell::new(WorkerStatus::Idle));

    let thread_run_flag = run_flag.clone();
    let thread_status = status.clone();

    let build = std::thread::Builder::new().name(format!("taskpool-worker-{id:?}"));
    let spawned = build.spawn(move || {
        worker_main(queue, thread_run_flag, thread_status, logger, idle_sleep, id)
    });

    match spawned {
        Ok(join) => Ok(WorkerHandle {
            id,
            run_flag,
            status,
            join: Some(join),
        }),
        Err(io_err) => Err(crate::error::Error::ResourceExhausted {
            message: io_err.to_string(),
        }),
    }
}

fn worker_main(
    queue: Arc<ReadyQueue>,
    run_flag: Arc<AtomicBool>,
    status: Arc<StatusCell>,
    logger: Arc<dyn PoolLogger>,
    idle_sleep: Duration,
    id: WorkerId,
) {
    let backoff = Backoff::new();

    loop {
        std::thread::yield_now();

        if !run_flag.load(Ordering::Acquire) {
            break;
        }

        let task = queue.try_pop_front();

        match task {
            Some(task) => {
                status.store(WorkerStatus::Running);
                backoff.reset();
                if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
                    let fault = crate::error::Error::TaskFault {
                        message: panic_message(&panic),
                    };
                    pool_error!(logger, LOG_CATEGORY, "absorbing task fault: {fault}");
                    #[cfg(test)]
                    crate::error::test_support::record(&fault);
                }
                status.store(WorkerStatus::Idle);
            }
            None => {
                status.store(WorkerStatus::Idle);
                if idle_sleep.is_zero() {
                    backoff.snooze();
                } else {
                    std::thread::sleep(idle_sleep);
                }
            }
        }
    }

    status.store(WorkerStatus::Finished);
    pool_debug!(logger, LOG_CATEGORY, "worker {id:?} exiting");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::DefaultLogger;
    use crate::task::test_support::RecordingTask;
    use std::sync::{Arc as StdArc, Mutex};
    use std::time::Duration;

    #[test]
    fn worker_runs_submitted_tasks_and_goes_idle() {
        let queue = StdArc::new(ReadyQueue::new());
        let logger: Arc<dyn PoolLogger> = Arc::new(DefaultLogger);
        let order = StdArc::new(Mutex::new(Vec::new()));

        queue.push_fifo(Box::new(RecordingTask {
            order: order.clone(),
            id: 1,
            priority: None,
        }));

        let mut handle = spawn(queue.clone(), logger, Duration::from_micros(10)).unwrap();
        // Give the worker a moment to claim and run the task.
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(*order.lock().unwrap(), vec![1]);
        assert_eq!(handle.status(), WorkerStatus::Idle);

        handle.signal_stop();
        handle.join();
        assert_eq!(handle.status(), WorkerStatus::Finished);
    }

    #[test]
    fn a_popped_task_runs_even_if_stop_is_signaled_before_it_finishes() {
        // Regression for the race at retirement time: the run flag is
        // checked once before the pop, never again afterward. A task that
        // signals its own worker's stop mid-run must still be allowed to
        // complete instead of being dropped once the flag flips.
        let queue = StdArc::new(ReadyQueue::new());
        let logger: Arc<dyn PoolLogger> = Arc::new(DefaultLogger);
        let order = StdArc::new(Mutex::new(Vec::new()));

        struct StopSelfAndRecord {
            run_flag: Arc<AtomicBool>,
            order: StdArc<Mutex<Vec<u64>>>,
        }
        impl crate::task::Task for StopSelfAndRecord {
            fn run(self: Box<Self>) {
                self.run_flag.store(false, Ordering::Release);
                self.order.lock().unwrap().push(1);
            }
        }

        let run_flag = Arc::new(AtomicBool::new(true));
        queue.push_fifo(Box::new(StopSelfAndRecord {
            run_flag: run_flag.clone(),
            order: order.clone(),
        }));

        let status = Arc::new(StatusCell::new(WorkerStatus::Idle));
        worker_main(queue, run_flag, status.clone(), logger, Duration::from_micros(10), WorkerId::new());

        assert_eq!(*order.lock().unwrap(), vec![1], "task must run to completion despite signaling its own stop");
        assert_eq!(status.load(), WorkerStatus::Finished);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        struct Boom;
        impl crate::task::Task for Boom {
            fn run(self: Box<Self>) {
                panic!("boom");
            }
        }

        crate::error::test_support::take_all(); // drain any leftovers from other tests

        let queue = StdArc::new(ReadyQueue::new());
        let logger: Arc<dyn PoolLogger> = Arc::new(DefaultLogger);
        queue.push_fifo(Box::new(Boom));

        let order = StdArc::new(Mutex::new(Vec::new()));
        let mut handle = spawn(queue.clone(), logger, Duration::from_micros(10)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        queue.push_fifo(Box::new(RecordingTask {
            order: order.clone(),
            id: 7,
            priority: None,
        }));
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(*order.lock().unwrap(), vec![7], "worker kept running after the panic");

        let absorbed = crate::error::test_support::take_all();
        assert!(
            absorbed
                .iter()
                .any(|e| matches!(e, crate::error::Error::TaskFault { message } if message.contains("boom"))),
            "panic should have been recorded as a TaskFault, got {absorbed:?}"
        );

        handle.signal_stop();
        handle.join();
    }
}
