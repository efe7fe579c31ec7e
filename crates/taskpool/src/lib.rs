//! A scaling in-process worker pool for plain, priority, and deadline-delayed
//! tasks.
//!
//! Submitters hand tasks to a [`Pool`] through one of three
//! [`SubmitMode`]s (or the deadline-based [`Pool::submit_delayed`]); a
//! background supervisor scales the worker population between a low and
//! high watermark in response to queue pressure, and promotes delayed tasks
//! once their deadline has passed.
//!
//! ```no_run
//! use taskpool::{Pool, SubmitMode, Task};
//!
//! struct PrintTask(&'static str);
//!
//! impl Task for PrintTask {
//!     fn run(self: Box<Self>) {
//!         println!("{}", self.0);
//!     }
//! }
//!
//! let pool = Pool::builder().low_watermark(1).high_watermark(4).build();
//! pool.start();
//! pool.submit(Box::new(PrintTask("hello")), SubmitMode::Fifo).unwrap();
//! pool.shutdown();
//! ```

mod clock;
mod config;
mod delayed_queue;
mod error;
mod logging;
mod pool;
mod ready_queue;
mod supervisor;
mod task;
mod unique_id;
mod worker;

pub use clock::{Clock, SystemClock};
pub use config::{MAX_WORKERS, SUPERVISOR_TICK_US, WORKER_IDLE_SLEEP_US};
pub use error::{Error, Result};
pub use logging::{DefaultLogger, PoolLogger};
pub use pool::{Pool, PoolBuilder, SubmitMode};
pub use task::{Priority, Task, MAX_PRIORITY, MIN_PRIORITY};
