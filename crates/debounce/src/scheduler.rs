//! Deferred execution primitives
//!
//! Debounced wrappers do not own a clock. They hand their callbacks to a
//! [`Scheduler`], which runs each one after a delay unless it is cancelled
//! first. [`TokioScheduler`] is the implementation used by default.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::trace;

use crate::error::DebounceError;

/// Callback handed to a scheduler
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Upper bound for deadlines that would overflow `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Host facility that runs callbacks after a delay
///
/// Implementations must not run `task` before `schedule_after` returns:
/// debounced wrappers hold their pending-call lock while scheduling.
pub trait Scheduler: Send + Sync + 'static {
    /// Token identifying a scheduled, not-yet-fired callback
    type Handle: Send + Sync + 'static;

    /// Run `task` once `delay` has elapsed
    fn schedule_after(&self, delay: Duration, task: Task) -> Self::Handle;

    /// Prevent a scheduled callback from running
    ///
    /// Cancelling a callback that already started is a no-op.
    fn cancel(&self, handle: Self::Handle);
}

/// Scheduler backed by tokio timers
///
/// Each scheduled callback is a spawned task sleeping until its deadline.
/// The runtime must have its time driver enabled.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Schedule onto an explicit runtime
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Schedule onto the runtime driving the current thread
    pub fn current() -> Result<Self, DebounceError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    type Handle = AbortHandle;

    fn schedule_after(&self, delay: Duration, task: Task) -> AbortHandle {
        // Deadline is fixed now, not when the spawned task is first polled
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);

        trace!("Scheduling callback in {:?}", delay);

        self.runtime
            .spawn(async move {
                tokio::time::sleep_until(deadline).await;
                task();
            })
            .abort_handle()
    }

    fn cancel(&self, handle: AbortHandle) {
        handle.abort();
    }
}
