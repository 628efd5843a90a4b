//! Trailing-edge debouncing of a single target
//!
//! A [`Debounced`] wrapper delays every invocation by the configured wait and
//! drops it again if another invocation arrives before the wait is over. Only
//! the last invocation of a burst reaches the target.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::DebounceConfig;
use crate::error::DebounceError;
use crate::scheduler::{Scheduler, TokioScheduler};

/// Observable state of a debounced wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No call is scheduled
    Idle,
    /// One call is scheduled and will fire unless superseded
    Pending,
}

/// Debounced wrapper around a target function
///
/// `C` is the invocation context and `A` the argument bundle passed through to
/// the target. Clones share the same pending call.
pub struct Debounced<C, A, S = TokioScheduler>
where
    S: Scheduler,
{
    inner: Arc<Inner<C, A, S>>,
}

struct Inner<C, A, S: Scheduler> {
    target: Box<dyn Fn(C, A) + Send + Sync>,
    wait: Duration,
    scheduler: S,
    slot: Mutex<PendingSlot<S::Handle>>,
}

/// Pending-call slot
///
/// `generation` identifies the most recent invocation. A scheduled call whose
/// generation is no longer current must not run the target.
struct PendingSlot<H> {
    generation: u64,
    pending: Option<H>,
}

impl<C, A> Debounced<C, A, TokioScheduler>
where
    C: Send + 'static,
    A: Send + 'static,
{
    /// Debounce `target` using the configured wait on the current runtime
    pub fn from_config<F>(target: F, config: &DebounceConfig) -> Result<Self, DebounceError>
    where
        F: Fn(C, A) + Send + Sync + 'static,
    {
        Ok(Self::new(target, config.wait(), TokioScheduler::current()?))
    }
}

impl<C, A, S> Debounced<C, A, S>
where
    C: Send + 'static,
    A: Send + 'static,
    S: Scheduler,
{
    /// Wrap `target` so that it runs `wait` after the last invocation
    pub fn new<F>(target: F, wait: Duration, scheduler: S) -> Self
    where
        F: Fn(C, A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                target: Box::new(target),
                wait,
                scheduler,
                slot: Mutex::new(PendingSlot {
                    generation: 0,
                    pending: None,
                }),
            }),
        }
    }

    /// Invoke the wrapper
    ///
    /// Cancels any pending call and schedules the target to run with
    /// `context` and `args` once `wait` has passed without another invocation.
    pub fn call(&self, context: C, args: A) {
        let mut slot = self.inner.slot.lock();

        if let Some(previous) = slot.pending.take() {
            trace!("Superseding pending call (generation {})", slot.generation);
            self.inner.scheduler.cancel(previous);
        }

        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        let inner = Arc::clone(&self.inner);
        let handle = self.inner.scheduler.schedule_after(
            self.inner.wait,
            Box::new(move || inner.fire(generation, context, args)),
        );
        slot.pending = Some(handle);
    }

    /// Convert into a plain closure with the wrapper's calling convention
    pub fn into_fn(self) -> impl Fn(C, A) + Clone + Send + Sync + 'static {
        move |context, args| self.call(context, args)
    }
}

impl<A, S> Debounced<(), A, S>
where
    A: Send + 'static,
    S: Scheduler,
{
    /// Invoke a wrapper whose target takes no context
    pub fn trigger(&self, args: A) {
        self.call((), args)
    }
}

impl<C, A, S: Scheduler> Debounced<C, A, S> {
    /// Whether a call is currently scheduled
    pub fn state(&self) -> DebounceState {
        if self.inner.slot.lock().pending.is_some() {
            DebounceState::Pending
        } else {
            DebounceState::Idle
        }
    }

    /// Quiet period required before the target runs
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }
}

impl<C, A, S: Scheduler> Inner<C, A, S> {
    fn fire(&self, generation: u64, context: C, args: A) {
        {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                // Superseded after its timer already elapsed
                return;
            }
            // Cleared before the target runs, so the target may call the
            // wrapper again and start a new burst
            slot.pending = None;
        }

        debug!("Running debounced call (generation {})", generation);
        (self.target)(context, args);
    }
}

impl<C, A, S: Scheduler> Clone for Debounced<C, A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, A, S: Scheduler> fmt::Debug for Debounced<C, A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("wait", &self.inner.wait)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    /// Wrapper whose target reports (context, arg, fire time) on a channel
    fn recording<C: Send + 'static>(
        wait: Duration,
    ) -> (
        Debounced<C, u32>,
        mpsc::UnboundedReceiver<(C, u32, Instant)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debounced = Debounced::new(
            move |context, arg| {
                let _ = tx.send((context, arg, Instant::now()));
            },
            wait,
            TokioScheduler::current().unwrap(),
        );
        (debounced, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_call_once() {
        let (debounced, mut rx) = recording::<()>(ms(100));
        let start = Instant::now();

        debounced.trigger(1);
        sleep(ms(30)).await;
        debounced.trigger(2);
        sleep(ms(20)).await;
        debounced.trigger(3);

        let ((), arg, fired_at) = rx.recv().await.unwrap();
        assert_eq!(arg, 3);
        assert_eq!(fired_at - start, ms(150));

        sleep(ms(1000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_call_runs_after_wait() {
        let (debounced, mut rx) = recording::<()>(ms(100));
        let start = Instant::now();

        debounced.trigger(1);

        let ((), arg, fired_at) = rx.recv().await.unwrap();
        assert_eq!(arg, 1);
        assert_eq!(fired_at - start, ms(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_calls_run_separately() {
        let (debounced, mut rx) = recording::<()>(ms(100));
        let start = Instant::now();

        debounced.trigger(1);
        sleep(ms(150)).await;
        debounced.trigger(2);

        let ((), first, first_at) = rx.recv().await.unwrap();
        let ((), second, second_at) = rx.recv().await.unwrap();
        assert_eq!((first, first_at - start), (1, ms(100)));
        assert_eq!((second, second_at - start), (2, ms(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_calls_never_run_target() {
        let (_debounced, mut rx) = recording::<()>(ms(100));

        sleep(ms(1000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_travels_with_last_call() {
        let (debounced, mut rx) = recording::<&'static str>(ms(50));

        debounced.call("editor", 1);
        sleep(ms(10)).await;
        debounced.call("terminal", 2);

        let (context, arg, _) = rx.recv().await.unwrap();
        assert_eq!((context, arg), ("terminal", 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (debounced, mut rx) = recording::<()>(ms(100));
        assert_eq!(debounced.state(), DebounceState::Idle);

        debounced.trigger(1);
        assert_eq!(debounced.state(), DebounceState::Pending);
        debounced.trigger(2);
        assert_eq!(debounced.state(), DebounceState::Pending);

        rx.recv().await.unwrap();
        assert_eq!(debounced.state(), DebounceState::Idle);

        // The wrapper cycles back to Pending on the next burst
        debounced.trigger(3);
        assert_eq!(debounced.state(), DebounceState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_call_survives_dropped_wrapper() {
        let (debounced, mut rx) = recording::<()>(ms(100));

        debounced.trigger(7);
        drop(debounced);

        let ((), arg, _) = rx.recv().await.unwrap();
        assert_eq!(arg, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_pending_call() {
        let (debounced, mut rx) = recording::<()>(ms(100));
        let other = debounced.clone();

        debounced.trigger(1);
        sleep(ms(50)).await;
        other.trigger(2);

        let ((), arg, _) = rx.recv().await.unwrap();
        assert_eq!(arg, 2);
        sleep(ms(1000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_into_fn_keeps_calling_convention() {
        let (debounced, mut rx) = recording::<u8>(ms(20));
        let notify = debounced.into_fn();

        notify(1, 10);
        notify(2, 20);

        let (context, arg, _) = rx.recv().await.unwrap();
        assert_eq!((context, arg), (2, 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config_uses_configured_wait() {
        let config = DebounceConfig { wait_ms: 250 };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debounced = Debounced::from_config(
            move |(), at: Instant| {
                let _ = tx.send(Instant::now() - at);
            },
            &config,
        )
        .unwrap();
        assert_eq!(debounced.wait(), ms(250));

        debounced.trigger(Instant::now());
        assert_eq!(rx.recv().await.unwrap(), ms(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_target_leaves_wrapper_usable() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debounced = Debounced::new(
            move |(), n: u32| {
                if n == 1 {
                    panic!("target failed on {}", n);
                }
                let _ = tx.send(n);
            },
            ms(100),
            TokioScheduler::current().unwrap(),
        );

        debounced.trigger(1);
        sleep(ms(200)).await;
        assert_eq!(debounced.state(), DebounceState::Idle);

        debounced.trigger(2);
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rapid_calls_on_worker_pool_run_once() {
        let (debounced, mut rx) = recording::<()>(ms(50));

        for i in 0..100 {
            debounced.trigger(i);
        }

        let ((), arg, _) = rx.recv().await.unwrap();
        assert_eq!(arg, 99);
        sleep(ms(200)).await;
        assert!(rx.try_recv().is_err());
    }
}
