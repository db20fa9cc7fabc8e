//! # capdb - Capped Collection Engine
//!
//! capdb implements the storage side of capped collections for a document
//! database: fixed-capacity, insertion-ordered stores that evict their oldest
//! documents once a byte or document-count bound is exceeded, plus the DDL
//! path that converts an existing regular collection into a capped one.
//!
//! ## Quick Start
//!
//! ```ignore
//! use capdb::{CommandDispatcher, Engine};
//! use serde_json::json;
//!
//! let dispatcher = CommandDispatcher::new(Engine::new());
//! dispatcher.run_command("app", &json!({ "insert": "log", "documents": [{ "msg": "hi" }] }));
//!
//! let reply = dispatcher.run_command("app", &json!({ "convertToCapped": "log", "size": 4096 }));
//! assert_eq!(reply, json!({ "ok": 1 }));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CommandDispatcher (JSON in/out)    │
//! ├─────────────────────────────────────┤
//! │   Engine: insert / scan / convert    │
//! ├───────────────────┬─────────────────┤
//! │ NamespaceCatalog  │ Namespace locks  │
//! ├───────────────────┴─────────────────┤
//! │   RegularStore    │   CappedStore    │
//! │                   │   (RingArena)    │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Error Codes
//!
//! Every failure that reaches a client carries a stable numeric code from
//! [`ErrorCode`]. A missing database or collection is always
//! `NamespaceNotFound` (26); the two cases differ only in message text.
//!
//! ## Module Overview
//!
//! - [`catalog`]: Namespace catalog and collection handles
//! - [`storage`]: Regular and capped stores, ring arena
//! - [`engine`]: Engine handle, locking, conversion
//! - [`command`]: Command document dispatch and replies
//! - [`config`]: Centralized constants and wire codes

pub mod catalog;
pub mod command;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod storage;

pub use catalog::{CollectionHandle, Namespace, NamespaceCatalog};
pub use command::CommandDispatcher;
pub use document::{Document, RecordId};
pub use engine::{
    CollectionStats, ConvertAck, ConvertRequest, Engine, EngineBuilder, EngineConfig, Interrupt,
};
pub use error::{CappedError, CappedResult, ErrorCode};
pub use storage::{CappedOptions, CappedStore, CollectionStorage, RegularStore, StorageKind};
