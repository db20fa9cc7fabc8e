//! # Namespace Catalog
//!
//! Tracks which databases and collections exist and what kind of storage
//! backs each collection.
//!
//! ## Hierarchy
//!
//! ```text
//! NamespaceCatalog
//! ├── Database "app"
//! │   ├── Collection "events"  -> Regular(RegularStore)
//! │   └── Collection "log"     -> Capped(CappedStore)
//! └── Database "metrics"
//!     └── ...
//! ```
//!
//! ## Handles and Epochs
//!
//! A lookup returns a [`CollectionHandle`]: the namespace, the storage it
//! resolved to, and the entry's epoch. The epoch is a catalog-wide counter
//! assigned whenever an entry is created or its storage replaced, so a handle
//! taken before a drop, recreate or conversion is detectably stale.
//!
//! ## Concurrency
//!
//! - The catalog holds a single `RwLock` (lookups vastly outnumber changes)
//! - Storage replacement is the only way conversion touches catalog state
//! - Lock ordering: namespace lock -> catalog lock -> store lock
//!
//! The catalog never moves document bytes. Stores own their documents and
//! the catalog owns `Arc` handles to stores.

#[allow(clippy::module_inception)]
mod catalog;
pub mod namespace;

pub use catalog::NamespaceCatalog;
pub use namespace::Namespace;

use crate::storage::{CappedOptions, CollectionStorage, StorageKind};

#[derive(Debug)]
pub(crate) struct CollectionEntry {
    storage: CollectionStorage,
    epoch: u64,
}

impl CollectionEntry {
    fn handle(&self, ns: &Namespace) -> CollectionHandle {
        CollectionHandle {
            namespace: ns.clone(),
            storage: self.storage.clone(),
            epoch: self.epoch,
        }
    }
}

/// A resolved catalog entry as of the moment of lookup.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    namespace: Namespace,
    storage: CollectionStorage,
    epoch: u64,
}

impl CollectionHandle {
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn storage(&self) -> &CollectionStorage {
        &self.storage
    }

    pub fn kind(&self) -> StorageKind {
        self.storage.kind()
    }

    pub fn capped_options(&self) -> Option<CappedOptions> {
        self.storage.capped_options()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
