//! Cooperative cancellation between pipeline stages

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anthrome_core::{Error, Result};

/// Shared flag checked before each stage starts.
///
/// Stages themselves are never interrupted; a cancelled run stops at the
/// next boundary and writes nothing.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}
