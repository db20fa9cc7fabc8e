//! # capdb Configuration Constants
//!
//! This module centralizes all configuration constants, grouping interdependent
//! values together and documenting their relationships.
//!
//! ## Dependency Graph
//!
//! ```text
//! MAX_USER_DOCUMENT_BYTES (16 MiB)
//!       │
//!       └─> DEFAULT_MAX_DOCUMENT_BYTES (must be <=)
//!             Per-engine cap applied to every write, overridable through
//!             EngineBuilder::max_document_bytes up to the hard limit.
//!
//! DEFAULT_RING_CAPACITY (64 slots)
//!       │
//!       └─> Initial slot count of a capped store's ring arena. The arena
//!           doubles when full, so this only affects early reallocations.
//!
//! LOCK_SHARD_COUNT (64)
//!       │
//!       └─> Shards of the namespace lock table. Unrelated namespaces only
//!           contend on the shard map, never on each other's lock.
//!
//! DEFAULT_LOCK_POLL_INTERVAL (10 ms)
//!       │
//!       └─> Slice length of a cancellable exclusive-lock wait. A waiting
//!           conversion observes cancellation within one slice.
//! ```
//!
//! ## Wire Codes
//!
//! Numeric error codes are part of the client compatibility surface and must
//! never change between releases. `NAMESPACE_NOT_FOUND_CODE` in particular is
//! asserted by client test suites.

use std::time::Duration;

// ============================================================================
// DOCUMENT LIMITS
// ============================================================================

/// Hard upper bound on a single stored document (16 MiB).
pub const MAX_USER_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

/// Default per-engine document cap.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = MAX_USER_DOCUMENT_BYTES;

const _: () = assert!(
    DEFAULT_MAX_DOCUMENT_BYTES <= MAX_USER_DOCUMENT_BYTES,
    "DEFAULT_MAX_DOCUMENT_BYTES must not exceed MAX_USER_DOCUMENT_BYTES"
);

// ============================================================================
// NAMESPACE LIMITS
// ============================================================================

/// Maximum length of a full `db.collection` name in bytes.
pub const MAX_NAMESPACE_BYTES: usize = 255;

/// Characters a database name must not contain.
pub const INVALID_DB_NAME_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];

// ============================================================================
// CAPPED STORE
// ============================================================================

/// Initial slot count of a capped store's ring arena.
pub const DEFAULT_RING_CAPACITY: usize = 64;

const _: () = assert!(
    DEFAULT_RING_CAPACITY.is_power_of_two(),
    "DEFAULT_RING_CAPACITY must be a power of two so doubling keeps it one"
);

// ============================================================================
// LOCKING
// ============================================================================

/// Number of shards for namespace-level locks.
pub const LOCK_SHARD_COUNT: usize = 64;

/// Slice length of a cancellable exclusive-lock wait.
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// WIRE ERROR CODES
// ============================================================================

pub const UNKNOWN_ERROR_CODE: i32 = 8;
pub const FAILED_TO_PARSE_CODE: i32 = 9;
pub const TYPE_MISMATCH_CODE: i32 = 14;
pub const ILLEGAL_OPERATION_CODE: i32 = 20;
pub const LOCK_TIMEOUT_CODE: i32 = 24;
pub const NAMESPACE_NOT_FOUND_CODE: i32 = 26;
pub const COMMAND_NOT_FOUND_CODE: i32 = 59;
pub const INVALID_OPTIONS_CODE: i32 = 72;
pub const INVALID_NAMESPACE_CODE: i32 = 73;
pub const CONFLICTING_OPERATION_CODE: i32 = 117;
pub const OBJECT_TOO_LARGE_CODE: i32 = 10334;
pub const INTERRUPTED_CODE: i32 = 11601;

const _: () = assert!(
    NAMESPACE_NOT_FOUND_CODE == 26,
    "NamespaceNotFound is a stable wire code"
);
