//! Trailing-edge debouncing for rapid-fire callbacks
//!
//! This crate provides:
//! - Debounced wrappers that run a target once a quiet period has passed
//! - Per-key debouncing (one timer per path, id, ...)
//! - A pluggable scheduler seam with a tokio-backed default
//! - TOML-loadable wait configuration
//!
//! ```no_run
//! # async fn demo() -> Result<(), debounce::DebounceError> {
//! use std::time::Duration;
//!
//! let save = debounce::debounce(
//!     |(), contents: String| println!("saving {} bytes", contents.len()),
//!     Duration::from_millis(250),
//! )?;
//!
//! save.trigger("draft 1".to_string());
//! save.trigger("draft 2".to_string()); // only this one is saved
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod keyed;
pub mod scheduler;

pub use config::{wait_from_millis, DebounceConfig};
pub use debounce::{DebounceState, Debounced};
pub use error::DebounceError;
pub use keyed::KeyedDebounced;
pub use scheduler::{Scheduler, Task, TokioScheduler};

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

/// Debounce `target` on the current tokio runtime
///
/// The returned wrapper runs `target` once `wait` has elapsed since its most
/// recent invocation, with that invocation's context and arguments.
pub fn debounce<C, A, F>(target: F, wait: Duration) -> Result<Debounced<C, A>, DebounceError>
where
    C: Send + 'static,
    A: Send + 'static,
    F: Fn(C, A) + Send + Sync + 'static,
{
    Ok(Debounced::new(target, wait, TokioScheduler::current()?))
}

/// Debounce `target` per key on the current tokio runtime
pub fn debounce_keyed<K, C, A, F>(
    target: F,
    wait: Duration,
) -> Result<KeyedDebounced<K, C, A>, DebounceError>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    C: Send + 'static,
    A: Send + 'static,
    F: Fn(K, C, A) + Send + Sync + 'static,
{
    Ok(KeyedDebounced::new(target, wait, TokioScheduler::current()?))
}
