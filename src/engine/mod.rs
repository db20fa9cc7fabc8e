//! # Engine
//!
//! The [`Engine`] handle ties the namespace catalog, the per-namespace lock
//! manager and the stores together. It is cheap to clone; every clone shares
//! one [`SharedEngine`].
//!
//! ## Paths
//!
//! ```text
//! insert(ns, doc)          shared lock ─> catalog get-or-create ─> store.insert
//! scan(ns) / stats(ns)     shared lock ─> catalog lookup ─> store read
//! convert_to_capped(req)   validate ─> exclusive lock ─> migrate ─> catalog swap
//! drop_collection(ns)      exclusive lock ─> catalog remove
//! ```
//!
//! Inserts dispatch on the storage tag: regular stores append, capped stores
//! append and evict.
//!
//! ## Lock Ordering
//!
//! Namespace lock, then catalog lock, then store lock. No path takes them in
//! another order.

pub mod builder;
mod convert;
pub mod interrupt;
pub mod namespace_locks;

pub use builder::EngineBuilder;
pub use convert::{ConvertAck, ConvertRequest};
pub use interrupt::Interrupt;
pub use namespace_locks::{LockStats, NamespaceLockManager};

use crate::catalog::{CollectionHandle, Namespace, NamespaceCatalog};
use crate::config::{DEFAULT_LOCK_POLL_INTERVAL, DEFAULT_MAX_DOCUMENT_BYTES};
use crate::document::{Document, RecordId};
use crate::error::{CappedError, CappedResult};
use crate::storage::{CollectionStorage, RegularStore};
use eyre::Result;
use namespace_locks::ExclusiveWait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub lock_timeout: Option<Duration>,
    pub lock_poll_interval: Duration,
    pub max_document_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: None,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

/// Per-collection summary reported by `collStats`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CollectionStats {
    pub ns: String,
    pub capped: bool,
    pub count: u64,
    pub size: u64,
    #[serde(rename = "maxSize", skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

pub(crate) struct SharedEngine {
    pub(crate) catalog: NamespaceCatalog,
    pub(crate) locks: NamespaceLockManager,
    pub(crate) config: EngineConfig,
}

#[derive(Clone)]
pub struct Engine {
    pub(crate) shared: Arc<SharedEngine>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn with_config(config: EngineConfig) -> Self {
        tracing::debug!(
            lock_timeout = ?config.lock_timeout,
            max_document_bytes = config.max_document_bytes,
            "engine initialized"
        );
        Self {
            shared: Arc::new(SharedEngine {
                catalog: NamespaceCatalog::new(),
                locks: NamespaceLockManager::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn catalog(&self) -> &NamespaceCatalog {
        &self.shared.catalog
    }

    pub fn lock_stats(&self) -> &LockStats {
        &self.shared.locks.stats
    }

    pub fn locks(&self) -> &NamespaceLockManager {
        &self.shared.locks
    }

    fn new_regular_storage(&self) -> CollectionStorage {
        CollectionStorage::Regular(Arc::new(RegularStore::new(
            self.shared.config.max_document_bytes,
        )))
    }

    /// Resolves a namespace, distinguishing a missing database from a
    /// missing collection.
    pub fn resolve(&self, ns: &Namespace) -> CappedResult<CollectionHandle> {
        let catalog = &self.shared.catalog;
        if !catalog.database_exists(ns.db()) {
            return Err(CappedError::DatabaseNotFound {
                db: ns.db().to_string(),
            });
        }
        catalog
            .lookup_collection(ns)
            .ok_or_else(|| CappedError::CollectionNotFound {
                namespace: ns.clone(),
            })
    }

    pub fn create_database(&self, db: &str) -> Result<()> {
        self.shared.catalog.create_database(db)
    }

    /// Explicitly creates an empty regular collection.
    pub fn create_collection(&self, ns: &Namespace) -> Result<()> {
        let _guard = self.shared.locks.shared(ns);
        self.shared
            .catalog
            .create_collection(ns, self.new_regular_storage())?;
        Ok(())
    }

    /// Inserts a document, implicitly creating the database and a regular
    /// collection on first use.
    pub fn insert(&self, ns: &Namespace, document: Document) -> Result<RecordId> {
        let _guard = self.shared.locks.shared(ns);
        let handle = self
            .shared
            .catalog
            .get_or_create_collection(ns, || self.new_regular_storage())?;
        Ok(handle.storage().insert(document)?)
    }

    pub fn insert_json(&self, ns: &Namespace, value: &Value) -> Result<RecordId> {
        self.insert(ns, Document::from_json(value)?)
    }

    /// Point-in-time copy of a collection in insertion order.
    pub fn scan(&self, ns: &Namespace) -> CappedResult<Vec<(RecordId, Document)>> {
        let _guard = self.shared.locks.shared(ns);
        Ok(self.resolve(ns)?.storage().snapshot())
    }

    pub fn collection_stats(&self, ns: &Namespace) -> CappedResult<CollectionStats> {
        let _guard = self.shared.locks.shared(ns);
        let handle = self.resolve(ns)?;
        let storage = handle.storage();
        let options = storage.capped_options();
        Ok(CollectionStats {
            ns: ns.to_string(),
            capped: options.is_some(),
            count: storage.document_count(),
            size: storage.size_bytes(),
            max_size: options.map(|o| o.max_size_bytes),
            max: options.and_then(|o| o.max_documents),
        })
    }

    /// Drops a collection under an exclusive lock. Returns false if it did
    /// not exist.
    pub fn drop_collection(&self, ns: &Namespace) -> CappedResult<bool> {
        let interrupt = Interrupt::new();
        self.drop_collection_with_interrupt(ns, &interrupt)
    }

    pub fn drop_collection_with_interrupt(
        &self,
        ns: &Namespace,
        interrupt: &Interrupt,
    ) -> CappedResult<bool> {
        let config = &self.shared.config;
        let _guard = self.shared.locks.exclusive(
            ns,
            &ExclusiveWait {
                interrupt,
                timeout: config.lock_timeout,
                poll_interval: config.lock_poll_interval,
            },
        )?;
        let dropped = self.shared.catalog.drop_collection(ns);
        if dropped {
            tracing::info!(namespace = %ns, "dropped collection");
        }
        Ok(dropped)
    }

    /// Removes a database and every collection in it. Catalog-only: an
    /// in-flight conversion in this database fails at its commit point.
    pub fn drop_database(&self, db: &str) -> bool {
        let dropped = self.shared.catalog.drop_database(db);
        if dropped {
            tracing::info!(db, "dropped database");
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageKind;
    use serde_json::json;
    use std::thread;

    #[test]
    fn insert_creates_database_and_collection() {
        let engine = Engine::new();
        let ns = Namespace::new("app", "events");
        assert!(!engine.catalog().database_exists("app"));
        let id = engine.insert_json(&ns, &json!({ "a": 1 })).unwrap();
        assert_eq!(id, RecordId::FIRST);
        assert!(engine.catalog().database_exists("app"));
        assert_eq!(
            engine.catalog().lookup_collection(&ns).unwrap().kind(),
            StorageKind::Regular
        );
    }

    #[test]
    fn insert_rejects_invalid_namespace() {
        let engine = Engine::new();
        assert!(engine.insert_json(&Namespace::new("", "c"), &json!({})).is_err());
        assert!(!engine.catalog().database_exists(""));
    }

    #[test]
    fn resolve_distinguishes_database_and_collection() {
        let engine = Engine::new();
        let ns = Namespace::new("app", "missing");
        assert!(matches!(
            engine.resolve(&ns),
            Err(CappedError::DatabaseNotFound { .. })
        ));
        engine.create_database("app").unwrap();
        assert!(matches!(
            engine.resolve(&ns),
            Err(CappedError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn stats_for_regular_collection() {
        let engine = Engine::new();
        let ns = Namespace::new("app", "events");
        engine.insert_json(&ns, &json!({})).unwrap();
        engine.insert_json(&ns, &json!({})).unwrap();
        let stats = engine.collection_stats(&ns).unwrap();
        assert!(!stats.capped);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.size, 4);
        assert_eq!(stats.max_size, None);
    }

    #[test]
    fn drop_collection_and_database() {
        let engine = Engine::new();
        let ns = Namespace::new("app", "events");
        engine.insert_json(&ns, &json!({})).unwrap();
        assert!(engine.drop_collection(&ns).unwrap());
        assert!(!engine.drop_collection(&ns).unwrap());
        assert!(engine.catalog().database_exists("app"));
        assert!(engine.drop_database("app"));
        assert!(!engine.drop_database("app"));
    }

    #[test]
    fn max_document_bytes_applies_to_regular_inserts() {
        let engine = Engine::builder().max_document_bytes(8).build().unwrap();
        let ns = Namespace::new("app", "events");
        let err = engine
            .insert_json(&ns, &json!({ "long": "value" }))
            .unwrap_err();
        let capped = err.downcast_ref::<CappedError>().unwrap();
        assert!(matches!(capped, CappedError::DocumentTooLarge { limit: 8, .. }));
    }

    #[test]
    fn clones_share_state_across_threads() {
        let engine = Engine::new();
        let ns = Namespace::new("app", "events");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                let ns = ns.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        engine.insert_json(&ns, &json!({ "i": i })).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(engine.collection_stats(&ns).unwrap().count, 200);
    }
}
