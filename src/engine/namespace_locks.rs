//! # Namespace-Level Locking
//!
//! Per-collection reader/writer locks. Ordinary reads and writes take a
//! shared lock on their namespace; conversion takes an exclusive one, which
//! blocks every other access to that collection and nothing else.
//!
//! ## Lock Types
//!
//! - **Shared (S)**: normal inserts and scans, compatible with each other
//! - **Exclusive (X)**: DDL such as conversion, blocks all access to the namespace
//!
//! Waiting exclusive requests block new shared requests, so a conversion is
//! not starved by a steady stream of writes.
//!
//! ## Cancellable Waits
//!
//! An exclusive wait parks on a condition variable in slices of
//! `poll_interval`. Between slices it checks the caller's [`Interrupt`] and
//! the optional timeout, failing with `Interrupted` or `LockTimeout`.
//!
//! ## Lock Sharding
//!
//! Lock entries live in a sharded map keyed by namespace and are reference
//! counted, so an entry is removed once its last holder or waiter leaves.

use super::interrupt::Interrupt;
use crate::catalog::Namespace;
use crate::config::LOCK_SHARD_COUNT;
use crate::error::{CappedError, CappedResult};
use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics for monitoring lock behavior
#[derive(Debug, Default)]
pub struct LockStats {
    pub shared_acquired: AtomicU64,
    pub exclusive_acquired: AtomicU64,
    pub exclusive_contended: AtomicU64,
    pub exclusive_abandoned: AtomicU64,
}

impl LockStats {
    fn record_exclusive(&self, contended: bool) {
        self.exclusive_acquired.fetch_add(1, Ordering::Relaxed);
        if contended {
            self.exclusive_contended.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Default)]
struct LockState {
    readers: u32,
    writer: bool,
    writers_waiting: u32,
}

struct LockEntry {
    state: Mutex<LockState>,
    released: Condvar,
    ref_count: AtomicU64,
}

impl LockEntry {
    fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            ref_count: AtomicU64::new(1),
        }
    }

    fn acquire(&self) {
        self.ref_count.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) -> bool {
        self.ref_count.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

struct LockShard {
    locks: Mutex<HashMap<Namespace, Arc<LockEntry>>>,
}

impl LockShard {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_create(&self, namespace: &Namespace) -> Arc<LockEntry> {
        let mut map = self.locks.lock();
        if let Some(entry) = map.get(namespace) {
            entry.acquire();
            return Arc::clone(entry);
        }
        let entry = Arc::new(LockEntry::new());
        map.insert(namespace.clone(), Arc::clone(&entry));
        entry
    }

    fn try_cleanup(&self, namespace: &Namespace, entry: &LockEntry) {
        // Refcounts only change under the map lock, and a stale entry must
        // never evict its replacement.
        let mut map = self.locks.lock();
        if entry.release()
            && map
                .get(namespace)
                .is_some_and(|current| std::ptr::eq(current.as_ref(), entry))
        {
            map.remove(namespace);
        }
    }
}

/// Guard for a shared namespace lock, released on drop
pub struct SharedGuard<'a> {
    manager: &'a NamespaceLockManager,
    namespace: Namespace,
    entry: Arc<LockEntry>,
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.entry.state.lock();
            state.readers -= 1;
            if state.readers == 0 {
                self.entry.released.notify_all();
            }
        }
        self.manager.cleanup(&self.namespace, &self.entry);
    }
}

/// Guard for an exclusive namespace lock, released on drop
pub struct ExclusiveGuard<'a> {
    manager: &'a NamespaceLockManager,
    namespace: Namespace,
    entry: Arc<LockEntry>,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.entry.state.lock();
            state.writer = false;
            self.entry.released.notify_all();
        }
        self.manager.cleanup(&self.namespace, &self.entry);
    }
}

/// Options for an exclusive acquisition.
#[derive(Debug, Clone)]
pub struct ExclusiveWait<'i> {
    pub interrupt: &'i Interrupt,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

pub struct NamespaceLockManager {
    shards: Vec<LockShard>,
    pub stats: LockStats,
}

impl Default for NamespaceLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceLockManager {
    pub fn new() -> Self {
        let shards = (0..LOCK_SHARD_COUNT).map(|_| LockShard::new()).collect();
        Self {
            shards,
            stats: LockStats::default(),
        }
    }

    fn shard(&self, namespace: &Namespace) -> &LockShard {
        let hash = namespace
            .db()
            .bytes()
            .chain(std::iter::once(b'.'))
            .chain(namespace.coll().bytes())
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        &self.shards[hash % LOCK_SHARD_COUNT]
    }

    fn cleanup(&self, namespace: &Namespace, entry: &LockEntry) {
        self.shard(namespace).try_cleanup(namespace, entry);
    }

    /// Acquire a shared lock (blocking)
    pub fn shared(&self, namespace: &Namespace) -> SharedGuard<'_> {
        let entry = self.shard(namespace).get_or_create(namespace);
        {
            let mut state = entry.state.lock();
            while state.writer || state.writers_waiting > 0 {
                entry.released.wait(&mut state);
            }
            state.readers += 1;
        }
        self.stats.shared_acquired.fetch_add(1, Ordering::Relaxed);
        SharedGuard {
            manager: self,
            namespace: namespace.clone(),
            entry,
        }
    }

    /// Acquire an exclusive lock, waiting cooperatively until it is granted,
    /// the interrupt fires, or the timeout elapses.
    pub fn exclusive(
        &self,
        namespace: &Namespace,
        wait: &ExclusiveWait<'_>,
    ) -> CappedResult<ExclusiveGuard<'_>> {
        let entry = self.shard(namespace).get_or_create(namespace);
        let started = Instant::now();
        let mut contended = false;

        let outcome = {
            let mut state = entry.state.lock();
            state.writers_waiting += 1;
            let outcome = loop {
                if !state.writer && state.readers == 0 {
                    state.writer = true;
                    break Ok(());
                }
                if !contended {
                    contended = true;
                    tracing::debug!(
                        namespace = %namespace,
                        readers = state.readers,
                        writer = state.writer,
                        "waiting for exclusive namespace lock"
                    );
                }
                if wait.interrupt.is_interrupted() {
                    break Err(CappedError::Interrupted {
                        namespace: namespace.clone(),
                    });
                }
                let slice = match wait.timeout {
                    Some(timeout) => {
                        let waited = started.elapsed();
                        if waited >= timeout {
                            break Err(CappedError::LockTimeout {
                                namespace: namespace.clone(),
                                waited,
                            });
                        }
                        wait.poll_interval.min(timeout - waited)
                    }
                    None => wait.poll_interval,
                };
                entry.released.wait_for(&mut state, slice);
            };
            state.writers_waiting -= 1;
            if outcome.is_err() {
                // Readers parked behind this waiter may proceed now.
                entry.released.notify_all();
            }
            outcome
        };

        match outcome {
            Ok(()) => {
                self.stats.record_exclusive(contended);
                Ok(ExclusiveGuard {
                    manager: self,
                    namespace: namespace.clone(),
                    entry,
                })
            }
            Err(err) => {
                self.stats.exclusive_abandoned.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    namespace = %namespace,
                    error = %err,
                    "abandoned exclusive lock wait"
                );
                self.cleanup(namespace, &entry);
                Err(err)
            }
        }
    }

    /// Number of namespaces with a live lock entry.
    pub fn active_entries(&self) -> usize {
        self.shards.iter().map(|s| s.locks.lock().len()).sum()
    }
}
