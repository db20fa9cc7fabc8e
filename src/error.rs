//! # Error Taxonomy
//!
//! Typed errors for the capped-collection subsystem. Every variant carries a
//! stable numeric [`ErrorCode`] that the command layer reports verbatim, so the
//! variant messages below are part of the client compatibility surface.
//!
//! Plumbing that never reaches the wire (catalog setup, document encoding)
//! uses `eyre::Result` instead. A `CappedError` wrapped inside an
//! `eyre::Report` is recovered by downcast in the dispatcher.

use crate::catalog::Namespace;
use crate::config::{
    COMMAND_NOT_FOUND_CODE, CONFLICTING_OPERATION_CODE, FAILED_TO_PARSE_CODE,
    ILLEGAL_OPERATION_CODE, INTERRUPTED_CODE, INVALID_NAMESPACE_CODE, INVALID_OPTIONS_CODE,
    LOCK_TIMEOUT_CODE, NAMESPACE_NOT_FOUND_CODE, OBJECT_TOO_LARGE_CODE, TYPE_MISMATCH_CODE,
    UNKNOWN_ERROR_CODE,
};
use crate::storage::CappedOptions;
use std::time::Duration;
use thiserror::Error;

/// Stable wire identifiers for error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownError,
    FailedToParse,
    TypeMismatch,
    IllegalOperation,
    LockTimeout,
    NamespaceNotFound,
    CommandNotFound,
    InvalidOptions,
    InvalidNamespace,
    ConflictingOperationInProgress,
    ObjectTooLarge,
    Interrupted,
}

impl ErrorCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ErrorCode::UnknownError => UNKNOWN_ERROR_CODE,
            ErrorCode::FailedToParse => FAILED_TO_PARSE_CODE,
            ErrorCode::TypeMismatch => TYPE_MISMATCH_CODE,
            ErrorCode::IllegalOperation => ILLEGAL_OPERATION_CODE,
            ErrorCode::LockTimeout => LOCK_TIMEOUT_CODE,
            ErrorCode::NamespaceNotFound => NAMESPACE_NOT_FOUND_CODE,
            ErrorCode::CommandNotFound => COMMAND_NOT_FOUND_CODE,
            ErrorCode::InvalidOptions => INVALID_OPTIONS_CODE,
            ErrorCode::InvalidNamespace => INVALID_NAMESPACE_CODE,
            ErrorCode::ConflictingOperationInProgress => CONFLICTING_OPERATION_CODE,
            ErrorCode::ObjectTooLarge => OBJECT_TOO_LARGE_CODE,
            ErrorCode::Interrupted => INTERRUPTED_CODE,
        }
    }

    /// The `codeName` reported alongside the numeric code.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCode::UnknownError => "UnknownError",
            ErrorCode::FailedToParse => "FailedToParse",
            ErrorCode::TypeMismatch => "TypeMismatch",
            ErrorCode::IllegalOperation => "IllegalOperation",
            ErrorCode::LockTimeout => "LockTimeout",
            ErrorCode::NamespaceNotFound => "NamespaceNotFound",
            ErrorCode::CommandNotFound => "CommandNotFound",
            ErrorCode::InvalidOptions => "InvalidOptions",
            ErrorCode::InvalidNamespace => "InvalidNamespace",
            ErrorCode::ConflictingOperationInProgress => "ConflictingOperationInProgress",
            ErrorCode::ObjectTooLarge => "BSONObjectTooLarge",
            ErrorCode::Interrupted => "Interrupted",
        }
    }
}

/// Errors surfaced by the capped store, the conversion engine and the
/// command dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CappedError {
    /// Malformed or non-positive `size` / `max`.
    #[error("{reason}")]
    InvalidOptions { reason: String },

    /// The owning database has no catalog presence.
    #[error("database {db} not found")]
    DatabaseNotFound { db: String },

    /// The database exists but the collection does not.
    #[error("source collection {namespace} does not exist")]
    CollectionNotFound { namespace: Namespace },

    /// Re-conversion with parameters that differ from the existing bounds.
    #[error("collection {namespace} is already capped with {existing}, requested {requested}")]
    AlreadyCapped {
        namespace: Namespace,
        existing: CappedOptions,
        requested: CappedOptions,
    },

    /// A single document larger than the store can ever hold.
    #[error("document of {size} bytes exceeds the {limit} byte limit")]
    DocumentTooLarge { size: usize, limit: u64 },

    #[error("timed out after {}ms waiting for exclusive lock on {namespace}", .waited.as_millis())]
    LockTimeout { namespace: Namespace, waited: Duration },

    #[error("operation on {namespace} was interrupted")]
    Interrupted { namespace: Namespace },

    /// The catalog entry changed between lookup and commit.
    #[error("collection {namespace} was dropped or replaced while the operation was in progress")]
    ConflictingOperation { namespace: Namespace },

    #[error("invalid namespace '{name}': {reason}")]
    InvalidNamespace { name: String, reason: String },

    #[error("{0}")]
    FailedToParse(String),

    #[error("{0}")]
    TypeMismatch(String),

    #[error("no such command: '{name}'")]
    CommandNotFound { name: String },
}

impl CappedError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidOptions { .. } => ErrorCode::InvalidOptions,
            Self::DatabaseNotFound { .. } | Self::CollectionNotFound { .. } => {
                ErrorCode::NamespaceNotFound
            }
            Self::AlreadyCapped { .. } => ErrorCode::IllegalOperation,
            Self::DocumentTooLarge { .. } => ErrorCode::ObjectTooLarge,
            Self::LockTimeout { .. } => ErrorCode::LockTimeout,
            Self::Interrupted { .. } => ErrorCode::Interrupted,
            Self::ConflictingOperation { .. } => ErrorCode::ConflictingOperationInProgress,
            Self::InvalidNamespace { .. } => ErrorCode::InvalidNamespace,
            Self::FailedToParse(_) => ErrorCode::FailedToParse,
            Self::TypeMismatch(_) => ErrorCode::TypeMismatch,
            Self::CommandNotFound { .. } => ErrorCode::CommandNotFound,
        }
    }

    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }
}

pub type CappedResult<T> = std::result::Result<T, CappedError>;
