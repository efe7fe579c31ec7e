use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// A process-wide unique id for a worker.
///
/// This opaque id is unique per process; it is how the supervisor keys the
/// worker collection (see the module docs on why workers are owned by id
/// rather than by pointer). The underlying implementation is very fast, and
/// the id contains a niche, meaning that `Option<WorkerId>` is never bigger
/// than the struct.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub(crate) struct WorkerId(NonZeroU64);

impl WorkerId {
    pub(crate) fn new() -> WorkerId {
        WorkerId(unique_u64())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        WorkerId::new()
    }
}

/// Return a process-wide unique u64.
fn unique_u64() -> NonZeroU64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let got = COUNTER.fetch_add(1, Ordering::Relaxed);
    NonZeroU64::new(got + 1).unwrap()
}
