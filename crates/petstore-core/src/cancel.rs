//! Cooperative cancellation for view loads.
//!
//! A load checks its token right after it resumes from the network wait and
//! before touching view state. Cancelling never aborts the underlying request;
//! it only stops a stale result from being applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token shared between a view and the load it started.
///
/// Cloning shares the flag: cancelling any clone is observed by all of them.
///
/// # Example
///
/// ```
/// use petstore_core::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let seen_by_load = token.clone();
///
/// token.cancel();
/// assert!(seen_by_load.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return an error if cancelled, for use with `?` after an `.await`.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// Error returned when a load is no longer wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation was cancelled")
    }
}

impl std::error::Error for CancelledError {}

/// Hands out one token per load and cancels the previous one.
///
/// Each view owns one of these so only its newest load may apply results.
#[derive(Debug, Default)]
pub struct LoadTracker {
    current: Option<CancellationToken>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, cancelling interest in whatever was running before.
    pub fn begin(&mut self) -> CancellationToken {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        token
    }

    /// Cancel the running load without starting another (view torn down).
    pub fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
    }
}
