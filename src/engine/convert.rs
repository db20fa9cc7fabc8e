//! # Regular-to-Capped Conversion
//!
//! Converts an existing regular collection into a capped one, re-homing its
//! documents into a fresh [`CappedStore`] and swapping the catalog entry.
//!
//! ## Validation Order
//!
//! The first failing check decides the reported error:
//!
//! 1. `size` (and `max`, when given) must be positive: `InvalidOptions`
//! 2. The database must exist: `database <db> not found`
//! 3. The collection must exist: `source collection <db>.<coll> does not exist`
//! 4. The collection must be regular. An already-capped collection with the
//!    same bounds is an idempotent success; different bounds fail with
//!    `AlreadyCapped`. Capped collections are never resized in place.
//!
//! ## Commit Protocol
//!
//! ```text
//! exclusive namespace lock
//!     │
//!     ├─ re-resolve the entry (it may have changed while we waited)
//!     ├─ stream regular documents, oldest first, into a private CappedStore
//!     │     (normal FIFO eviction applies if the data exceeds the bounds)
//!     ├─ catalog.replace_storage_kind(handle, Capped(store))   <- commit point
//!     └─ release lock
//! ```
//!
//! Nothing is published before the catalog swap. Any failure before it
//! (interrupt, oversized document, stale handle) drops the private store and
//! leaves the regular collection untouched.

use super::namespace_locks::ExclusiveWait;
use super::{Engine, Interrupt};
use crate::catalog::{CollectionHandle, Namespace};
use crate::error::{CappedError, CappedResult};
use crate::storage::{CappedOptions, CappedStore, CollectionStorage};
use std::sync::Arc;
use std::time::Instant;

/// A conversion request as received from the command layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub namespace: Namespace,
    pub size: i64,
    pub max: Option<i64>,
}

impl ConvertRequest {
    pub fn new(db: impl Into<String>, coll: impl Into<String>, size: i64) -> Self {
        Self {
            namespace: Namespace::new(db, coll),
            size,
            max: None,
        }
    }

    pub fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Checks the numeric bounds. Runs before any catalog lookup.
    pub fn options(&self) -> CappedResult<CappedOptions> {
        if self.size <= 0 {
            return Err(CappedError::invalid_options(format!(
                "invalid capped collection size {}: must be greater than 0",
                self.size
            )));
        }
        let max = match self.max {
            Some(max) if max <= 0 => {
                return Err(CappedError::invalid_options(format!(
                    "invalid capped collection max {}: must be greater than 0",
                    max
                )))
            }
            Some(max) => Some(max as u64),
            None => None,
        };
        CappedOptions::new(self.size as u64, max)
    }
}

/// Acknowledgment of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConvertAck {
    pub ns: String,
    /// True when the collection was already capped with the same bounds.
    pub already_capped: bool,
    pub migrated: u64,
    pub evicted: u64,
    pub document_count: u64,
    pub size_bytes: u64,
}

impl Engine {
    pub fn convert_to_capped(&self, request: &ConvertRequest) -> CappedResult<ConvertAck> {
        self.convert_to_capped_with_interrupt(request, &Interrupt::new())
    }

    pub fn convert_to_capped_with_interrupt(
        &self,
        request: &ConvertRequest,
        interrupt: &Interrupt,
    ) -> CappedResult<ConvertAck> {
        let result = self.run_conversion(request, interrupt);
        if let Err(err) = &result {
            tracing::debug!(
                namespace = %request.namespace,
                code = err.code().as_i32(),
                error = %err,
                "convertToCapped failed"
            );
        }
        result
    }

    fn run_conversion(
        &self,
        request: &ConvertRequest,
        interrupt: &Interrupt,
    ) -> CappedResult<ConvertAck> {
        let options = request.options()?;
        let ns = &request.namespace;

        let handle = self.resolve(ns)?;
        if let CollectionStorage::Capped(store) = handle.storage() {
            return already_capped(ns, store, options);
        }

        tracing::info!(
            namespace = %ns,
            size = options.max_size_bytes,
            max = ?options.max_documents,
            "converting collection to capped"
        );

        let config = &self.shared.config;
        let _guard = self.shared.locks.exclusive(
            ns,
            &ExclusiveWait {
                interrupt,
                timeout: config.lock_timeout,
                poll_interval: config.lock_poll_interval,
            },
        )?;

        // The entry may have been dropped, recreated or converted while we
        // waited for the lock.
        let handle = self.resolve(ns)?;
        let source = match handle.storage() {
            CollectionStorage::Regular(store) => Arc::clone(store),
            CollectionStorage::Capped(store) => return already_capped(ns, store, options),
        };

        let started = Instant::now();
        let target = CappedStore::with_document_limit(options, config.max_document_bytes);
        let mut migrated = 0u64;
        for (_, document) in source.iter() {
            interrupt.check(ns)?;
            target.insert(document)?;
            migrated += 1;
        }
        interrupt.check(ns)?;

        let stats = target.stats();
        let committed = self.commit(&handle, target)?;
        drop(source);

        tracing::info!(
            namespace = %ns,
            migrated,
            evicted = stats.evicted_total,
            retained = stats.document_count,
            epoch = committed.epoch(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "collection converted to capped"
        );

        Ok(ConvertAck {
            ns: ns.to_string(),
            already_capped: false,
            migrated,
            evicted: stats.evicted_total,
            document_count: stats.document_count,
            size_bytes: stats.size_bytes,
        })
    }

    fn commit(
        &self,
        handle: &CollectionHandle,
        target: CappedStore,
    ) -> CappedResult<CollectionHandle> {
        self.shared
            .catalog
            .replace_storage_kind(handle, CollectionStorage::Capped(Arc::new(target)))
    }
}

fn already_capped(
    ns: &Namespace,
    store: &CappedStore,
    requested: CappedOptions,
) -> CappedResult<ConvertAck> {
    let existing = store.options();
    if existing != requested {
        return Err(CappedError::AlreadyCapped {
            namespace: ns.clone(),
            existing,
            requested,
        });
    }
    let stats = store.stats();
    Ok(ConvertAck {
        ns: ns.to_string(),
        already_capped: true,
        migrated: 0,
        evicted: 0,
        document_count: stats.document_count,
        size_bytes: stats.size_bytes,
    })
}
