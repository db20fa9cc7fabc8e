//! # Capped Store
//!
//! Fixed-capacity, insertion-ordered document store. The store is bounded by a
//! byte budget (`max_size_bytes`) and optionally by a document count
//! (`max_documents`). Admitting a document that would break either bound
//! first evicts the oldest documents, strictly FIFO, until the bound holds.
//!
//! ## Atomicity
//!
//! Eviction and admission happen under one mutex acquisition, so concurrent
//! inserts never interleave between the two. Readers observe either the state
//! before an insert or the state after it, never a store that has evicted but
//! not yet admitted.
//!
//! ## Oversized Documents
//!
//! A document that alone exceeds `max_size_bytes` (or the engine-wide
//! document cap) is rejected before the lock is taken. Nothing is evicted on
//! that path.
//!
//! ## Cursors
//!
//! [`CappedStore::iter`] returns a lazy cursor that remembers the next
//! [`RecordId`] it wants and re-reads the live store on every step. If that
//! position has since been evicted the cursor resumes at the oldest retained
//! document. Use [`CappedStore::snapshot`] for a pinned, point-in-time copy.

use super::ring::RingArena;
use crate::config::{DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_RING_CAPACITY};
use crate::document::{Document, RecordId};
use crate::error::{CappedError, CappedResult};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::fmt;

/// Bounds of a capped collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct CappedOptions {
    pub max_size_bytes: u64,
    pub max_documents: Option<u64>,
}

impl CappedOptions {
    pub fn new(max_size_bytes: u64, max_documents: Option<u64>) -> CappedResult<Self> {
        if max_size_bytes == 0 {
            return Err(CappedError::invalid_options(
                "capped collection size must be greater than 0",
            ));
        }
        if max_documents == Some(0) {
            return Err(CappedError::invalid_options(
                "capped collection max document count must be greater than 0",
            ));
        }
        Ok(Self {
            max_size_bytes,
            max_documents,
        })
    }
}

impl fmt::Display for CappedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_documents {
            Some(max) => write!(f, "size {} and max {}", self.max_size_bytes, max),
            None => write!(f, "size {}", self.max_size_bytes),
        }
    }
}

/// Result of a successful insert: the new position and every record that
/// was evicted to make room for it, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub id: RecordId,
    pub evicted: SmallVec<[RecordId; 4]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CappedStats {
    pub size_bytes: u64,
    pub document_count: u64,
    pub evicted_total: u64,
    pub options: CappedOptions,
}

struct Entry {
    id: RecordId,
    document: Document,
}

struct CappedInner {
    ring: RingArena<Entry>,
    size_bytes: u64,
    next_id: RecordId,
    evicted_total: u64,
}

impl CappedInner {
    fn exceeds_bounds(&self, options: &CappedOptions, incoming: u64) -> bool {
        let over_size = self.size_bytes + incoming > options.max_size_bytes;
        let over_count = options
            .max_documents
            .is_some_and(|max| self.ring.len() as u64 + 1 > max);
        over_size || over_count
    }
}

pub struct CappedStore {
    options: CappedOptions,
    max_document_bytes: usize,
    inner: Mutex<CappedInner>,
}

impl CappedStore {
    pub fn new(options: CappedOptions) -> Self {
        Self::with_document_limit(options, DEFAULT_MAX_DOCUMENT_BYTES)
    }

    pub fn with_document_limit(options: CappedOptions, max_document_bytes: usize) -> Self {
        let initial = options
            .max_documents
            .map(|max| (max as usize).clamp(1, DEFAULT_RING_CAPACITY))
            .unwrap_or(DEFAULT_RING_CAPACITY);
        Self {
            options,
            max_document_bytes,
            inner: Mutex::new(CappedInner {
                ring: RingArena::with_capacity(initial),
                size_bytes: 0,
                next_id: RecordId::FIRST,
                evicted_total: 0,
            }),
        }
    }

    pub fn options(&self) -> CappedOptions {
        self.options
    }

    pub fn insert(&self, document: Document) -> CappedResult<InsertOutcome> {
        let size = document.size_bytes();
        let limit = self
            .options
            .max_size_bytes
            .min(self.max_document_bytes as u64);
        if size as u64 > limit {
            return Err(CappedError::DocumentTooLarge { size, limit });
        }

        let mut inner = self.inner.lock();
        let mut evicted = SmallVec::new();
        while !inner.ring.is_empty() && inner.exceeds_bounds(&self.options, size as u64) {
            if let Some(oldest) = inner.ring.pop_front() {
                inner.size_bytes -= oldest.document.size_bytes() as u64;
                inner.evicted_total += 1;
                evicted.push(oldest.id);
            }
        }

        let id = inner.next_id;
        inner.next_id = id.next();
        inner.size_bytes += size as u64;
        inner.ring.push_back(Entry { id, document });

        if !evicted.is_empty() {
            tracing::trace!(
                id = id.get(),
                evicted = evicted.len(),
                size_bytes = inner.size_bytes,
                "capped insert evicted oldest documents"
            );
        }

        Ok(InsertOutcome { id, evicted })
    }

    pub fn current_size_bytes(&self) -> u64 {
        self.inner.lock().size_bytes
    }

    pub fn current_document_count(&self) -> u64 {
        self.inner.lock().ring.len() as u64
    }

    pub fn oldest_id(&self) -> Option<RecordId> {
        self.inner.lock().ring.front().map(|e| e.id)
    }

    pub fn newest_id(&self) -> Option<RecordId> {
        self.inner.lock().ring.back().map(|e| e.id)
    }

    pub fn stats(&self) -> CappedStats {
        let inner = self.inner.lock();
        CappedStats {
            size_bytes: inner.size_bytes,
            document_count: inner.ring.len() as u64,
            evicted_total: inner.evicted_total,
            options: self.options,
        }
    }

    /// Lazy cursor over the live store, oldest first.
    pub fn iter(&self) -> CappedCursor<'_> {
        CappedCursor {
            store: self,
            next: RecordId::FIRST,
        }
    }

    /// Pinned copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<(RecordId, Document)> {
        let inner = self.inner.lock();
        inner
            .ring
            .iter()
            .map(|e| (e.id, e.document.clone()))
            .collect()
    }

    fn first_at_or_after(&self, id: RecordId) -> Option<(RecordId, Document)> {
        let inner = self.inner.lock();
        let idx = inner.ring.partition_point(|e| e.id < id);
        inner.ring.get(idx).map(|e| (e.id, e.document.clone()))
    }
}

impl fmt::Debug for CappedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("CappedStore")
            .field("options", &self.options)
            .field("size_bytes", &stats.size_bytes)
            .field("document_count", &stats.document_count)
            .finish()
    }
}

pub struct CappedCursor<'a> {
    store: &'a CappedStore,
    next: RecordId,
}

impl Iterator for CappedCursor<'_> {
    type Item = (RecordId, Document);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, document) = self.store.first_at_or_after(self.next)?;
        self.next = id.next();
        Some((id, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn doc(n: u64) -> Document {
        Document::from_json(&json!({ "n": n })).unwrap()
    }

    fn ids(store: &CappedStore) -> Vec<u64> {
        store.iter().map(|(id, _)| id.get()).collect()
    }

    #[test]
    fn options_reject_non_positive_bounds() {
        assert!(matches!(
            CappedOptions::new(0, None),
            Err(CappedError::InvalidOptions { .. })
        ));
        assert!(matches!(
            CappedOptions::new(10, Some(0)),
            Err(CappedError::InvalidOptions { .. })
        ));
        assert!(CappedOptions::new(10, Some(1)).is_ok());
    }

    #[test]
    fn evicts_oldest_on_byte_bound() {
        let d = doc(1);
        let each = d.size_bytes() as u64;
        let store = CappedStore::new(CappedOptions::new(each * 3, None).unwrap());

        for n in 1..=3 {
            let outcome = store.insert(doc(n)).unwrap();
            assert!(outcome.evicted.is_empty());
        }
        let outcome = store.insert(doc(4)).unwrap();
        assert_eq!(outcome.evicted.as_slice(), &[RecordId(1)]);
        assert_eq!(ids(&store), vec![2, 3, 4]);
        assert_eq!(store.current_size_bytes(), each * 3);
    }

    #[test]
    fn evicts_oldest_on_count_bound() {
        let store = CappedStore::new(CappedOptions::new(1 << 20, Some(2)).unwrap());
        for n in 1..=5 {
            store.insert(doc(n)).unwrap();
        }
        assert_eq!(ids(&store), vec![4, 5]);
        assert_eq!(store.current_document_count(), 2);
        assert_eq!(store.stats().evicted_total, 3);
    }

    #[test]
    fn large_document_evicts_several() {
        let small = doc(1);
        let big = Document::from_json(&json!({ "pad": "x".repeat(40) })).unwrap();
        let bound = big.size_bytes() as u64 + small.size_bytes() as u64;
        let store = CappedStore::new(CappedOptions::new(bound, None).unwrap());
        for n in 1..=5 {
            store.insert(doc(n)).unwrap();
        }
        let outcome = store.insert(big.clone()).unwrap();
        assert!(outcome.evicted.len() >= 4);
        assert!(store.current_size_bytes() <= bound);
        assert_eq!(store.snapshot().last().map(|(_, d)| d.clone()), Some(big));
    }

    #[test]
    fn oversized_document_leaves_store_unchanged() {
        let store = CappedStore::new(CappedOptions::new(16, None).unwrap());
        store.insert(Document::from_json(&json!({})).unwrap()).unwrap();
        let before = store.snapshot();

        let huge = Document::from_json(&json!({ "pad": "x".repeat(64) })).unwrap();
        let err = store.insert(huge).unwrap_err();
        assert!(matches!(err, CappedError::DocumentTooLarge { limit: 16, .. }));
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.stats().evicted_total, 0);
    }

    #[test]
    fn document_limit_caps_below_size_bound() {
        let store = CappedStore::with_document_limit(CappedOptions::new(1024, None).unwrap(), 8);
        let err = store.insert(doc(123456)).unwrap_err();
        assert!(matches!(err, CappedError::DocumentTooLarge { limit: 8, .. }));
    }

    #[test]
    fn cursor_reflects_live_contents() {
        let store = CappedStore::new(CappedOptions::new(1 << 20, Some(3)).unwrap());
        for n in 1..=3 {
            store.insert(doc(n)).unwrap();
        }
        let mut cursor = store.iter();
        assert_eq!(cursor.next().map(|(id, _)| id), Some(RecordId(1)));

        store.insert(doc(4)).unwrap();
        store.insert(doc(5)).unwrap();

        // Position 2 was evicted; the cursor resumes at the oldest survivor.
        let rest: Vec<_> = cursor.map(|(id, _)| id.get()).collect();
        assert_eq!(rest, vec![3, 4, 5]);

        // A fresh pass starts over from the current head.
        assert_eq!(ids(&store), vec![3, 4, 5]);
    }

    #[test]
    fn concurrent_inserts_respect_bounds_and_order() {
        let d = doc(100);
        let bound = d.size_bytes() as u64 * 16;
        let store = Arc::new(CappedStore::new(CappedOptions::new(bound, Some(10)).unwrap()));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..250 {
                        store.insert(doc(100 + t * 1000 + i)).unwrap();
                        assert!(store.current_size_bytes() <= bound);
                        assert!(store.current_document_count() <= 10);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert!(snapshot.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(store.newest_id(), Some(RecordId(1000)));
        assert_eq!(store.oldest_id(), Some(RecordId(991)));
        let stats = store.stats();
        assert_eq!(stats.evicted_total, 990);
        let total: u64 = snapshot.iter().map(|(_, d)| d.size_bytes() as u64).sum();
        assert_eq!(total, stats.size_bytes);
    }
}
