//! Cooperative cancellation
//!
//! Long-running loops (grouping, aggregation, row filtering) poll a
//! [`CancelToken`] between groups and periodically between rows. Cancelling does
//! not roll anything back: an in-place evaluation that is cancelled may leave its
//! sheet partially mutated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};

/// Rows processed between two cancellation polls
pub const ROW_POLL_INTERVAL: usize = 1024;

/// Shared flag that asks a running evaluation to stop
///
/// Clones share the same flag, so a caller keeps one clone and hands another to
/// the engine.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with [`EngineError::Cancelled`] if cancellation was requested
    pub fn check(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Poll at row granularity: checks only every [`ROW_POLL_INTERVAL`] rows
    pub fn check_row(&self, row: usize) -> EngineResult<()> {
        if row % ROW_POLL_INTERVAL == 0 {
            self.check()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let engine_side = token.clone();
        assert!(engine_side.check().is_ok());
        token.cancel();
        assert!(matches!(engine_side.check(), Err(EngineError::Cancelled)));
    }

    #[test]
    fn test_row_polling_interval() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.check_row(0).is_err());
        assert!(token.check_row(1).is_ok());
        assert!(token.check_row(ROW_POLL_INTERVAL).is_err());
    }
}
