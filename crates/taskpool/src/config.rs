//! Pool configuration: watermarks and the scaling-pressure threshold.
//!
//! Grounded on the original `DynamicPoolInt`'s `setLowWatermark`/
//! `setHighWatermark` clamp semantics and `WORKERTHREAD_MAX`, translated to
//! plain atomics per the "Configuration watermarks ... Atomic" discipline.
//! The scaling-pressure threshold (`max_queue_size`) mirrors the original
//! `ThreadPool::scheduler`'s stateful `max_func_size`: it starts at 1 and
//! doubles on each on-demand worker spawn / halves on each retirement,
//! rather than being recomputed from the live worker count on every tick.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Absolute ceiling on worker count, matching the original's
/// `WORKERTHREAD_MAX` build-time constant.
pub const MAX_WORKERS: u8 = 30;

/// Supervisor sleep between ticks.
pub const SUPERVISOR_TICK_US: u64 = 1000;

/// Worker sleep when the ready queue is empty.
pub const WORKER_IDLE_SLEEP_US: u64 = 10;

pub(crate) struct Watermarks {
    low: AtomicU8,
    high: AtomicU8,
    max_queue_size: AtomicUsize,
    /// Per-instance ceiling, defaulted from [`MAX_WORKERS`] but allowed to be
    /// narrowed (never widened) by [`crate::PoolBuilder`] -- see the crate
    /// docs on why this is a construction-time default rather than only a
    /// compile-time constant.
    ceiling: u8,
}

impl Watermarks {
    pub(crate) fn new(low: u8, high: u8, ceiling: u8) -> Self {
        let ceiling = ceiling.min(MAX_WORKERS);
        let high = high.min(ceiling).max(1);
        let low = low.min(high);
        Watermarks {
            low: AtomicU8::new(low),
            high: AtomicU8::new(high),
            max_queue_size: AtomicUsize::new(1),
            ceiling,
        }
    }

    pub(crate) fn low(&self) -> u8 {
        self.low.load(Ordering::Acquire)
    }

    pub(crate) fn high(&self) -> u8 {
        self.high.load(Ordering::Acquire)
    }

    pub(crate) fn ceiling(&self) -> u8 {
        self.ceiling
    }

    /// `low` is clamped to not exceed the current `high`.
    pub(crate) fn set_low(&self, requested: u8) {
        let high = self.high();
        self.low.store(requested.min(high), Ordering::Release);
    }

    /// `high` is clamped to `[low + 1, ceiling]`.
    pub(crate) fn set_high(&self, requested: u8) {
        let low = self.low();
        let lower_bound = low.saturating_add(1).min(self.ceiling);
        let clamped = requested.max(lower_bound).min(self.ceiling);
        self.high.store(clamped, Ordering::Release);
    }

    pub(crate) fn max_queue_size(&self) -> usize {
        self.max_queue_size.load(Ordering::Acquire)
    }

    /// Double the scaling-pressure threshold. Called once per on-demand
    /// worker spawn (`supervisor.rs`'s `scale` phase), mirroring the original
    /// `ThreadPool::scheduler`'s stateful `max_func_size`, which starts at 1
    /// and doubles on every on-demand spawn rather than being recomputed from
    /// the live worker count each tick. Produces hysteresis: the more
    /// on-demand spawns have already happened, the more queue pressure is
    /// required to trigger another.
    pub(crate) fn on_demand_spawn(&self) {
        let current = self.max_queue_size.load(Ordering::Acquire);
        let doubled = current.checked_shl(1).unwrap_or(usize::MAX);
        self.max_queue_size.store(doubled, Ordering::Release);
    }

    /// Halve the scaling-pressure threshold, floored at 1. Called once per
    /// idle-worker retirement, the inverse of [`Watermarks::on_demand_spawn`].
    pub(crate) fn on_retirement(&self) {
        let current = self.max_queue_size.load(Ordering::Acquire);
        self.max_queue_size.store((current / 2).max(1), Ordering::Release);
    }
}
