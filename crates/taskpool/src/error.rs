//! Error taxonomy for the pool.
//!
//! Only [`Error::WrongCapability`] is ever returned to a caller (see the crate
//! docs). The other variants are built at the site where a runtime failure
//! is absorbed (worker spawn, clock read, task panic) and logged via their
//! `Display` impl instead of an ad hoc string, so that [`test_support`] can
//! assert on the *kind* of an absorbed failure rather than string-matching a
//! log line.

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A task was submitted with [`crate::SubmitMode::Priority`] (or via
    /// [`crate::Pool::submit_priority`]) but [`crate::Task::priority`]
    /// returned `None`.
    #[error("task lacks the priority capability required by this submission mode")]
    WrongCapability,

    /// Spawning a worker's OS thread failed.
    #[error("failed to spawn worker thread: {message}")]
    ResourceExhausted { message: String },

    /// The injected [`crate::Clock`] failed during a delayed-queue promotion
    /// pass.
    #[error("clock unavailable: {message}")]
    ClockUnavailable { message: String },

    /// A task's `run()` unwound. Absorbed at the worker boundary; this
    /// variant exists purely so the event can be logged with a typed cause.
    #[error("task panicked: {message}")]
    TaskFault { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
