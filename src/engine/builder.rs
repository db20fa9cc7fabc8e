//! # Engine Builder
//!
//! Fluent configuration for an [`Engine`].
//!
//! ## Configuration Options
//!
//! | Option             | Default  | Description                                   |
//! |--------------------|----------|-----------------------------------------------|
//! | lock_timeout       | none     | Upper bound on an exclusive lock wait         |
//! | lock_poll_interval | 10 ms    | Cancellation check granularity while waiting  |
//! | max_document_bytes | 16 MiB   | Per-document cap applied to every store       |
//!
//! ## Usage
//!
//! ```ignore
//! let engine = Engine::builder()
//!     .lock_timeout(Duration::from_secs(5))
//!     .max_document_bytes(1024 * 1024)
//!     .build()?;
//! ```

use super::{Engine, EngineConfig};
use crate::config::MAX_USER_DOCUMENT_BYTES;
use eyre::{ensure, Result};
use std::time::Duration;

pub struct EngineBuilder {
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Fail exclusive lock waits with `LockTimeout` after `timeout`.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = Some(timeout);
        self
    }

    /// Wait for exclusive locks until granted or interrupted.
    pub fn no_lock_timeout(mut self) -> Self {
        self.config.lock_timeout = None;
        self
    }

    pub fn lock_poll_interval(mut self, interval: Duration) -> Self {
        self.config.lock_poll_interval = interval;
        self
    }

    pub fn max_document_bytes(mut self, bytes: usize) -> Self {
        self.config.max_document_bytes = bytes;
        self
    }

    pub fn build(self) -> Result<Engine> {
        let config = self.config;
        ensure!(
            !config.lock_poll_interval.is_zero(),
            "lock_poll_interval must be non-zero"
        );
        ensure!(
            config.max_document_bytes > 0 && config.max_document_bytes <= MAX_USER_DOCUMENT_BYTES,
            "max_document_bytes must be between 1 and {}, got {}",
            MAX_USER_DOCUMENT_BYTES,
            config.max_document_bytes
        );
        if let Some(timeout) = config.lock_timeout {
            ensure!(!timeout.is_zero(), "lock_timeout must be non-zero");
        }
        Ok(Engine::with_config(config))
    }
}
