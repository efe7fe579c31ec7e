//! The time source collaborator (see crate docs, "Time source").
//!
//! The original design reads wall-clock time via a call that can fail
//! (`gettimeofday`); we keep that fallibility in the trait even though the
//! default implementation, backed by [`std::time::Instant`], cannot actually
//! fail on any platform Rust supports. This lets tests exercise
//! [`crate::Error::ClockUnavailable`] with a fake clock without special-casing
//! production code.

use std::time::Instant;

use crate::error::{Error, Result};

/// A wall-clock-ish time source.
///
/// Deadlines are expressed as [`Instant`]s (monotonic) rather than
/// calendar time, which sidesteps the original's issues with system clock
/// adjustments while keeping microsecond-or-better resolution.
pub trait Clock: Send + Sync {
    /// Read the current instant. An `Err` aborts the in-progress delayed
    /// queue promotion pass (see [`crate::Error::ClockUnavailable`]); it does
    /// not promote anything and the next supervisor tick retries.
    fn try_now(&self) -> Result<Instant>;
}

/// The default [`Clock`], backed directly by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn try_now(&self) -> Result<Instant> {
        Ok(Instant::now())
    }
}
