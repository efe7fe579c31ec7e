//! Pluggable diagnostic sink.
//!
//! The source this crate is modeled on has a process-wide logger singleton.
//! Here it's a dependency injected into [`crate::Pool`] at construction (see
//! [`crate::PoolBuilder::logger`]); internal components receive it by
//! reference and never reach for a global. The default forwards to the `log`
//! crate's facade, matching the plain (non-realtime) log call sites this
//! codebase already uses for its background scheduling thread.
//!
//! Every call site in `supervisor.rs`/`worker.rs`/`pool.rs` logs *after*
//! releasing whatever pool mutex it was holding, per the "MUST NOT hold any
//! pool mutex across a sink call" contract.

use std::fmt::Arguments;

/// A diagnostic sink the pool emits level-tagged, categorized messages to.
///
/// Implementations must be safe to call concurrently from any pool thread
/// (workers, the supervisor, submitter threads) and must not block
/// indefinitely; registering one is expected to be idempotent (the same sink
/// may be handed to more than one pool).
pub trait PoolLogger: Send + Sync {
    fn log(&self, level: log::Level, category: &str, message: Arguments<'_>);
}

/// Forwards to the `log` crate's global facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLogger;

impl PoolLogger for DefaultLogger {
    fn log(&self, level: log::Level, category: &str, message: Arguments<'_>) {
        log::log!(target: category, level, "{message}");
    }
}

macro_rules! pool_log {
    ($logger:expr, $level:expr, $category:expr, $($arg:tt)+) => {
        $logger.log($level, $category, format_args!($($arg)+))
    };
}

macro_rules! pool_debug {
    ($logger:expr, $category:expr, $($arg:tt)+) => {
        pool_log!($logger, log::Level::Debug, $category, $($arg)+)
    };
}

macro_rules! pool_info {
    ($logger:expr, $category:expr, $($arg:tt)+) => {
        pool_log!($logger, log::Level::Info, $category, $($arg)+)
    };
}

macro_rules! pool_warn {
    ($logger:expr, $category:expr, $($arg:tt)+) => {
        pool_log!($logger, log::Level::Warn, $category, $($arg)+)
    };
}

macro_rules! pool_error {
    ($logger:expr, $category:expr, $($arg:tt)+) => {
        pool_log!($logger, log::Level::Error, $category, $($arg)+)
    };
}

pub(crate) use {pool_debug, pool_error, pool_info, pool_log, pool_warn};
