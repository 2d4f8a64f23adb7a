//! Cooperative cancellation.
//!
//! The orchestration layer keeps a clone of the token and flips it; solvers
//! check it between discrete steps, never inside a kernel dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use osteon_types::{OsteonError, OsteonResult};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the "running" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clears a previous request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled { step })` if cancellation was requested.
    pub fn check(&self, step: u32) -> OsteonResult<()> {
        if self.is_cancelled() {
            Err(OsteonError::Cancelled { step })
        } else {
            Ok(())
        }
    }
}
