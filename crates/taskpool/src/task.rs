//! The unit of work the pool schedules.

/// Priority of a task. Lower is lower priority; `0` is the lowest legitimate
/// priority and larger values win ties in the [`super::SubmitMode::Priority`]
/// insertion scan.
pub type Priority = i64;

/// Sentinel used by [`super::SubmitMode::Lifo`] submission. Any value
/// strictly greater than every legitimate priority in use would do; this is
/// the value the pool actually uses.
pub const MAX_PRIORITY: Priority = 100;

/// Sentinel used by [`super::SubmitMode::Fifo`] submission.
pub const MIN_PRIORITY: Priority = 0;

/// Caller-supplied unit of work.
///
/// A task runs exactly once: `run()` takes the task by (boxed) value, so
/// there is no "re-arm" protocol and no way to resubmit an already-dispatched
/// task. Implement [`Task::priority`]/[`Task::set_priority`] only if the task
/// should be eligible for [`super::SubmitMode::Priority`] submission or
/// [`super::Pool::submit_priority`]; tasks that leave the defaults in place
/// lack the priority capability and are rejected with
/// [`crate::Error::WrongCapability`] by those two paths (FIFO and LIFO
/// submission never require it).
pub trait Task: Send + 'static {
    /// Execute the task. Panics here are caught at the worker boundary and
    /// logged as [`crate::Error::TaskFault`]; they never bring a worker down.
    fn run(self: Box<Self>);

    /// This task's current priority, or `None` if it doesn't track one.
    fn priority(&self) -> Option<Priority> {
        None
    }

    /// Override this task's priority.
    ///
    /// Called by the pool as a side effect of FIFO/LIFO submission (see
    /// [`super::SubmitMode`]) so that the value is consistent if the task is
    /// later inspected through priority-aware logic. The default no-op is
    /// correct for tasks that don't track priority at all.
    fn set_priority(&mut self, _priority: Priority) {}
}
