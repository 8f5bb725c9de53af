use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DecodeError;

/// Cooperative cancellation flag for in-flight decodes.
///
/// Clones share the same flag, so the scheduler can keep one handle and give
/// another to the worker running the decode.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    pub id: String,
    is_cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.is_cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled.load(Ordering::Relaxed)
    }

    pub fn throw_if_cancelled(&self) -> Result<(), DecodeError> {
        if self.is_cancelled() {
            Err(DecodeError::Cancelled)
        } else {
            Ok(())
        }
    }
}
