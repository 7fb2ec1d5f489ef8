//! Cooperative cancellation, polled by the engine between iterations.
//!
//! Engine state is local to each call, so an abandoned computation only has
//! to drop its buffers.

use mandeltile_core::{MandelError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait CancellationChecker: Sync {
    fn is_cancelled(&self) -> bool;

    /// `Err(Cancelled)` once cancellation has been requested.
    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MandelError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Checker for callers that never abandon work.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancellationChecker for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared flag; clones observe the same cancellation.
#[derive(Clone, Debug, Default)]
pub struct AtomicBoolChecker {
    flag: Arc<AtomicBool>,
}

impl AtomicBoolChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag owned by the caller.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl CancellationChecker for AtomicBoolChecker {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_cancel_checks_ok() {
        assert!(!NeverCancel.is_cancelled());
        assert!(NeverCancel.check().is_ok());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let checker = AtomicBoolChecker::new();
        let other = checker.clone();
        assert!(other.check().is_ok());

        checker.cancel();
        assert!(other.is_cancelled());
        assert!(matches!(other.check(), Err(MandelError::Cancelled)));
    }

    #[test]
    fn external_flag_drives_checker() {
        let flag = Arc::new(AtomicBool::new(false));
        let checker = AtomicBoolChecker::from_flag(Arc::clone(&flag));
        assert!(!checker.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(checker.is_cancelled());
    }
}
