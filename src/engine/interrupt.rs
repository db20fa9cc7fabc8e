//! Cooperative cancellation for long-running catalog operations.
//!
//! An [`Interrupt`] is a shared flag. The caller that owns the request keeps
//! one clone and hands another to the operation; the operation polls it while
//! waiting for locks and between migrated documents.

use crate::catalog::Namespace;
use crate::error::{CappedError, CappedResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn check(&self, namespace: &Namespace) -> CappedResult<()> {
        if self.is_interrupted() {
            return Err(CappedError::Interrupted {
                namespace: namespace.clone(),
            });
        }
        Ok(())
    }
}
