//! Per-key debouncing
//!
//! Runs one independent debounce timer per key, e.g. one per changed path.
//! A burst on one key never delays or supersedes a call for another key.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::DebounceConfig;
use crate::error::DebounceError;
use crate::scheduler::{Scheduler, TokioScheduler};

/// Debounced wrapper with one pending call per key
pub struct KeyedDebounced<K, C, A, S = TokioScheduler>
where
    K: Eq + Hash,
    S: Scheduler,
{
    inner: Arc<KeyedInner<K, C, A, S>>,
}

struct KeyedInner<K: Eq + Hash, C, A, S: Scheduler> {
    target: Box<dyn Fn(K, C, A) + Send + Sync>,
    wait: Duration,
    scheduler: S,
    /// Keys with a scheduled call
    pending: DashMap<K, PendingCall<S::Handle>>,
    next_generation: AtomicU64,
}

struct PendingCall<H> {
    generation: u64,
    handle: H,
}

impl<K, C, A> KeyedDebounced<K, C, A, TokioScheduler>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    C: Send + 'static,
    A: Send + 'static,
{
    /// Debounce `target` per key using the configured wait on the current runtime
    pub fn from_config<F>(target: F, config: &DebounceConfig) -> Result<Self, DebounceError>
    where
        F: Fn(K, C, A) + Send + Sync + 'static,
    {
        Ok(Self::new(target, config.wait(), TokioScheduler::current()?))
    }
}

impl<K, C, A, S> KeyedDebounced<K, C, A, S>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    C: Send + 'static,
    A: Send + 'static,
    S: Scheduler,
{
    /// Wrap `target` so that each key runs `wait` after its last invocation
    pub fn new<F>(target: F, wait: Duration, scheduler: S) -> Self
    where
        F: Fn(K, C, A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(KeyedInner {
                target: Box::new(target),
                wait,
                scheduler,
                pending: DashMap::new(),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Invoke the wrapper for `key`
    ///
    /// Only a pending call for the same key is superseded.
    pub fn call(&self, key: K, context: C, args: A) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        // The entry guard is held until the new handle is stored, so a firing
        // call for this key cannot observe a half-updated slot.
        match self.inner.pending.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let handle = self.schedule(key, generation, context, args);
                let previous = occupied.insert(PendingCall { generation, handle });
                trace!("Superseding pending call for {:?}", occupied.key());
                self.inner.scheduler.cancel(previous.handle);
            }
            Entry::Vacant(vacant) => {
                let handle = self.schedule(key, generation, context, args);
                vacant.insert(PendingCall { generation, handle });
            }
        }
    }

    fn schedule(&self, key: K, generation: u64, context: C, args: A) -> S::Handle {
        let inner = Arc::clone(&self.inner);
        self.inner.scheduler.schedule_after(
            self.inner.wait,
            Box::new(move || inner.fire(key, generation, context, args)),
        )
    }
}

impl<K, C, A, S> KeyedDebounced<K, C, A, S>
where
    K: Eq + Hash,
    S: Scheduler,
{
    /// Whether a call is scheduled for `key`
    pub fn is_pending(&self, key: &K) -> bool {
        self.inner.pending.contains_key(key)
    }

    /// Number of keys with a scheduled call
    pub fn pending_len(&self) -> usize {
        self.inner.pending.len()
    }

    /// Quiet period required before a key's target call runs
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }
}

impl<K, C, A, S> KeyedInner<K, C, A, S>
where
    K: Eq + Hash + fmt::Debug,
    S: Scheduler,
{
    fn fire(&self, key: K, generation: u64, context: C, args: A) {
        let current = self
            .pending
            .remove_if(&key, |_, call| call.generation == generation)
            .is_some();
        if !current {
            return;
        }

        debug!("Running debounced call for {:?}", key);
        (self.target)(key, context, args);
    }
}

impl<K: Eq + Hash, C, A, S: Scheduler> Clone for KeyedDebounced<K, C, A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, C, A, S: Scheduler> fmt::Debug for KeyedDebounced<K, C, A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedDebounced")
            .field("wait", &self.inner.wait)
            .field("pending", &self.inner.pending.len())
            .finish()
    }
}
