//! # Namespace Catalog
//!
//! Process-wide registry of databases and their collections. Every mutation
//! is a single write-lock critical section, so a lookup observes either the
//! entry before a change or after it.

use super::namespace::{validate_db_name, Namespace};
use super::{CollectionEntry, CollectionHandle};
use crate::error::{CappedError, CappedResult};
use crate::storage::CollectionStorage;
use eyre::{ensure, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct DatabaseEntry {
    collections: HashMap<String, CollectionEntry>,
}

#[derive(Debug)]
struct CatalogState {
    databases: HashMap<String, DatabaseEntry>,
    next_epoch: u64,
}

impl CatalogState {
    fn allocate_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }
}

#[derive(Debug)]
pub struct NamespaceCatalog {
    state: RwLock<CatalogState>,
}

impl Default for NamespaceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceCatalog {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState {
                databases: HashMap::new(),
                next_epoch: 1,
            }),
        }
    }

    pub fn database_exists(&self, db: &str) -> bool {
        self.state.read().databases.contains_key(db)
    }

    pub fn create_database(&self, db: &str) -> Result<()> {
        validate_db_name(db)?;
        let mut state = self.state.write();
        ensure!(
            !state.databases.contains_key(db),
            "database '{}' already exists",
            db
        );
        state.databases.insert(db.to_string(), DatabaseEntry::default());
        Ok(())
    }

    /// Creates the database if it is missing. Returns true when it was created.
    pub fn ensure_database(&self, db: &str) -> Result<bool> {
        validate_db_name(db)?;
        let mut state = self.state.write();
        if state.databases.contains_key(db) {
            return Ok(false);
        }
        state.databases.insert(db.to_string(), DatabaseEntry::default());
        Ok(true)
    }

    /// Registers a new collection, creating its database implicitly.
    pub fn create_collection(
        &self,
        ns: &Namespace,
        storage: CollectionStorage,
    ) -> Result<CollectionHandle> {
        ns.validate()?;
        let mut state = self.state.write();
        let epoch = state.allocate_epoch();
        let database = state.databases.entry(ns.db().to_string()).or_default();
        ensure!(
            !database.collections.contains_key(ns.coll()),
            "collection '{}' already exists",
            ns
        );
        let entry = CollectionEntry { storage, epoch };
        let handle = entry.handle(ns);
        database.collections.insert(ns.coll().to_string(), entry);
        Ok(handle)
    }

    /// Looks up a collection, creating it with `make` when absent.
    pub fn get_or_create_collection<F>(&self, ns: &Namespace, make: F) -> Result<CollectionHandle>
    where
        F: FnOnce() -> CollectionStorage,
    {
        if let Some(handle) = self.lookup_collection(ns) {
            return Ok(handle);
        }
        ns.validate()?;
        let mut state = self.state.write();
        let epoch = state.allocate_epoch();
        let database = state.databases.entry(ns.db().to_string()).or_default();
        let entry = database
            .collections
            .entry(ns.coll().to_string())
            .or_insert_with(|| CollectionEntry {
                storage: make(),
                epoch,
            });
        Ok(entry.handle(ns))
    }

    pub fn lookup_collection(&self, ns: &Namespace) -> Option<CollectionHandle> {
        let state = self.state.read();
        state
            .databases
            .get(ns.db())
            .and_then(|db| db.collections.get(ns.coll()))
            .map(|entry| entry.handle(ns))
    }

    /// Swaps the storage descriptor of the entry `handle` was taken from.
    ///
    /// Fails with `ConflictingOperation` if the entry was dropped or replaced
    /// since the handle was issued. On success the returned handle carries the
    /// new epoch and the previous storage is released.
    pub fn replace_storage_kind(
        &self,
        handle: &CollectionHandle,
        storage: CollectionStorage,
    ) -> CappedResult<CollectionHandle> {
        let ns = handle.namespace();
        let mut state = self.state.write();
        let epoch = state.allocate_epoch();
        let entry = state
            .databases
            .get_mut(ns.db())
            .and_then(|db| db.collections.get_mut(ns.coll()))
            .filter(|entry| entry.epoch == handle.epoch())
            .ok_or_else(|| CappedError::ConflictingOperation {
                namespace: ns.clone(),
            })?;
        entry.storage = storage;
        entry.epoch = epoch;
        Ok(entry.handle(ns))
    }

    pub fn drop_collection(&self, ns: &Namespace) -> bool {
        let mut state = self.state.write();
        state
            .databases
            .get_mut(ns.db())
            .and_then(|db| db.collections.remove(ns.coll()))
            .is_some()
    }

    pub fn drop_database(&self, db: &str) -> bool {
        self.state.write().databases.remove(db).is_some()
    }

    pub fn list_databases(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().databases.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn list_collections(&self, db: &str) -> Option<Vec<String>> {
        let state = self.state.read();
        let database = state.databases.get(db)?;
        let mut names: Vec<_> = database.collections.keys().cloned().collect();
        names.sort();
        Some(names)
    }
}
