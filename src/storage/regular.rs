//! # Regular Store
//!
//! Unbounded, insertion-ordered document store backing ordinary collections.
//! Records are kept in a vector ordered by [`RecordId`], so positional lookups
//! are a binary search.

use crate::config::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::document::{Document, RecordId};
use crate::error::{CappedError, CappedResult};
use parking_lot::RwLock;
use std::fmt;

struct RegularInner {
    records: Vec<(RecordId, Document)>,
    size_bytes: u64,
    next_id: RecordId,
}

pub struct RegularStore {
    max_document_bytes: usize,
    inner: RwLock<RegularInner>,
}

impl Default for RegularStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_BYTES)
    }
}

impl RegularStore {
    pub fn new(max_document_bytes: usize) -> Self {
        Self {
            max_document_bytes,
            inner: RwLock::new(RegularInner {
                records: Vec::new(),
                size_bytes: 0,
                next_id: RecordId::FIRST,
            }),
        }
    }

    pub fn insert(&self, document: Document) -> CappedResult<RecordId> {
        let size = document.size_bytes();
        if size > self.max_document_bytes {
            return Err(CappedError::DocumentTooLarge {
                size,
                limit: self.max_document_bytes as u64,
            });
        }

        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id = id.next();
        inner.size_bytes += size as u64;
        inner.records.push((id, document));
        Ok(id)
    }

    pub fn len(&self) -> u64 {
        self.inner.read().records.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    pub fn size_bytes(&self) -> u64 {
        self.inner.read().size_bytes
    }

    /// Point-in-time copy of every record in storage order.
    pub fn scan(&self) -> Vec<(RecordId, Document)> {
        self.inner.read().records.clone()
    }

    /// Lazy cursor in storage order.
    pub fn iter(&self) -> RegularCursor<'_> {
        RegularCursor {
            store: self,
            next: RecordId::FIRST,
        }
    }

    fn first_at_or_after(&self, id: RecordId) -> Option<(RecordId, Document)> {
        let inner = self.inner.read();
        let idx = inner.records.partition_point(|(rid, _)| *rid < id);
        inner.records.get(idx).cloned()
    }
}

impl fmt::Debug for RegularStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("RegularStore")
            .field("document_count", &inner.records.len())
            .field("size_bytes", &inner.size_bytes)
            .finish()
    }
}

pub struct RegularCursor<'a> {
    store: &'a RegularStore,
    next: RecordId,
}

impl Iterator for RegularCursor<'_> {
    type Item = (RecordId, Document);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, document) = self.store.first_at_or_after(self.next)?;
        self.next = id.next();
        Some((id, document))
    }
}
