//! Error types for debounced wrappers

use thiserror::Error;

/// Errors raised while binding a debounced wrapper to its scheduler
///
/// Invoking a wrapper never fails; only construction against the ambient
/// runtime can.
#[derive(Debug, Error)]
pub enum DebounceError {
    /// No tokio runtime is running on the current thread
    #[error("no tokio runtime available to schedule debounced calls")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
