//! # Namespaces
//!
//! A [`Namespace`] is the `(database, collection)` pair identifying a
//! collection. It renders as `db.collection`; the collection part may itself
//! contain dots, so parsing splits on the first one only.

use crate::config::{INVALID_DB_NAME_CHARS, MAX_NAMESPACE_BYTES};
use crate::error::{CappedError, CappedResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Namespace {
    db: String,
    coll: String,
}

impl Namespace {
    pub fn new(db: impl Into<String>, coll: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            coll: coll.into(),
        }
    }

    pub fn parse(full: &str) -> CappedResult<Self> {
        let (db, coll) = full
            .split_once('.')
            .ok_or_else(|| CappedError::InvalidNamespace {
                name: full.to_string(),
                reason: "expected <database>.<collection>".to_string(),
            })?;
        let ns = Self::new(db, coll);
        ns.validate()?;
        Ok(ns)
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn coll(&self) -> &str {
        &self.coll
    }

    pub fn validate(&self) -> CappedResult<()> {
        validate_db_name(&self.db)?;
        let invalid = |reason: &str| CappedError::InvalidNamespace {
            name: self.to_string(),
            reason: reason.to_string(),
        };
        if self.coll.is_empty() {
            return Err(invalid("collection name is empty"));
        }
        if self.coll.contains(['$', '\0']) {
            return Err(invalid("collection name contains an illegal character"));
        }
        if self.db.len() + 1 + self.coll.len() > MAX_NAMESPACE_BYTES {
            return Err(invalid("namespace is too long"));
        }
        Ok(())
    }
}

pub fn validate_db_name(db: &str) -> CappedResult<()> {
    let invalid = |reason: &str| CappedError::InvalidNamespace {
        name: db.to_string(),
        reason: reason.to_string(),
    };
    if db.is_empty() {
        return Err(invalid("database name is empty"));
    }
    if db.contains(INVALID_DB_NAME_CHARS) {
        return Err(invalid("database name contains an illegal character"));
    }
    if db.len() >= MAX_NAMESPACE_BYTES {
        return Err(invalid("database name is too long"));
    }
    Ok(())
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.coll)
    }
}
