//! # Collection Storage
//!
//! Storage backends for collections. A collection's storage is a tagged
//! variant rather than a trait object: write and conversion paths dispatch on
//! the tag because the two kinds have different admission rules.
//!
//! ```text
//! CollectionStorage
//! ├── Regular(Arc<RegularStore>)   unbounded, insertion-ordered
//! └── Capped(Arc<CappedStore>)     bounded ring buffer, FIFO eviction
//!         └── RingArena<Entry>     slots + head/len indices
//! ```
//!
//! Stores own their documents; the catalog only owns the `Arc` handles.
//! Replacing a catalog entry's storage drops the old handle, which releases
//! the old store once the last in-flight reader finishes with it.

pub mod capped;
pub mod regular;
pub mod ring;

pub use capped::{CappedCursor, CappedOptions, CappedStats, CappedStore, InsertOutcome};
pub use regular::{RegularCursor, RegularStore};
pub use ring::RingArena;

use crate::document::{Document, RecordId};
use crate::error::CappedResult;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Regular,
    Capped,
}

#[derive(Debug, Clone)]
pub enum CollectionStorage {
    Regular(Arc<RegularStore>),
    Capped(Arc<CappedStore>),
}

impl CollectionStorage {
    pub fn kind(&self) -> StorageKind {
        match self {
            CollectionStorage::Regular(_) => StorageKind::Regular,
            CollectionStorage::Capped(_) => StorageKind::Capped,
        }
    }

    pub fn capped_options(&self) -> Option<CappedOptions> {
        match self {
            CollectionStorage::Regular(_) => None,
            CollectionStorage::Capped(store) => Some(store.options()),
        }
    }

    pub fn insert(&self, document: Document) -> CappedResult<RecordId> {
        match self {
            CollectionStorage::Regular(store) => store.insert(document),
            CollectionStorage::Capped(store) => store.insert(document).map(|o| o.id),
        }
    }

    pub fn document_count(&self) -> u64 {
        match self {
            CollectionStorage::Regular(store) => store.len(),
            CollectionStorage::Capped(store) => store.current_document_count(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            CollectionStorage::Regular(store) => store.size_bytes(),
            CollectionStorage::Capped(store) => store.current_size_bytes(),
        }
    }

    /// Point-in-time copy of the contents in insertion order.
    pub fn snapshot(&self) -> Vec<(RecordId, Document)> {
        match self {
            CollectionStorage::Regular(store) => store.scan(),
            CollectionStorage::Capped(store) => store.snapshot(),
        }
    }
}
