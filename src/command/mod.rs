//! # Command Dispatcher
//!
//! Thin translation layer between command documents and the engine. Request
//! transport, authentication and reply serialization belong to the caller;
//! this module only turns a `serde_json::Value` command into an engine call
//! and the result into a reply document.
//!
//! ## Supported Commands
//!
//! | Command           | Fields                                  | Reply                         |
//! |-------------------|-----------------------------------------|-------------------------------|
//! | `convertToCapped` | `size`, optional `max` / `maxDocuments` | `{ ok: 1 }`                   |
//! | `insert`          | `documents` (array of objects)          | `{ ok: 1, n }`                |
//! | `drop`            |                                         | `{ ok: 1, ns, dropped }`      |
//! | `dropDatabase`    |                                         | `{ ok: 1, dropped? }`         |
//! | `collStats`       |                                         | `{ ok: 1, ns, capped, ... }`  |
//!
//! The command name is the first key of the document. Numeric fields accept
//! integral or floating JSON numbers; floats are truncated toward zero.
//!
//! `insert` is ordered: documents are inserted one by one and the first
//! failure ends the batch with an error reply. Earlier documents stay.

pub mod reply;

use crate::catalog::Namespace;
use crate::document::{json_type_name, Document};
use crate::engine::{ConvertRequest, Engine, Interrupt};
use crate::error::{CappedError, CappedResult};
use eyre::Result;
use serde_json::{json, Map, Value};

pub struct CommandDispatcher {
    engine: Engine,
}

impl CommandDispatcher {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs `command` against database `db` and returns the reply document.
    /// Never fails: errors are reported inside the reply.
    pub fn run_command(&self, db: &str, command: &Value) -> Value {
        self.run_command_with_interrupt(db, command, &Interrupt::new())
    }

    pub fn run_command_with_interrupt(
        &self,
        db: &str,
        command: &Value,
        interrupt: &Interrupt,
    ) -> Value {
        match self.dispatch(db, command, interrupt) {
            Ok(reply) => reply,
            Err(report) => reply::from_report(&report),
        }
    }

    fn dispatch(&self, db: &str, command: &Value, interrupt: &Interrupt) -> Result<Value> {
        let body = command.as_object().ok_or_else(|| {
            CappedError::FailedToParse(format!(
                "command must be an object, got {}",
                json_type_name(command)
            ))
        })?;
        let (name, target) = body
            .iter()
            .next()
            .ok_or_else(|| CappedError::FailedToParse("empty command document".to_string()))?;

        tracing::debug!(db, command = name.as_str(), "dispatching command");

        match name.as_str() {
            "convertToCapped" => self.convert_to_capped(db, target, body, interrupt),
            "insert" => self.insert(db, target, body),
            "drop" => self.drop_collection(db, target, interrupt),
            "dropDatabase" => Ok(self.drop_database(db)),
            "collStats" => self.coll_stats(db, target),
            other => Err(CappedError::CommandNotFound {
                name: other.to_string(),
            }
            .into()),
        }
    }

    fn convert_to_capped(
        &self,
        db: &str,
        target: &Value,
        body: &Map<String, Value>,
        interrupt: &Interrupt,
    ) -> Result<Value> {
        let coll = collection_name("convertToCapped", target)?;
        let size = numeric_field(body, "size")?.ok_or_else(|| {
            CappedError::invalid_options("convertToCapped requires a numeric 'size' field")
        })?;
        let max = match numeric_field(body, "max")? {
            Some(max) => Some(max),
            None => numeric_field(body, "maxDocuments")?,
        };

        let mut request = ConvertRequest::new(db, coll, size);
        request.max = max;
        self.engine
            .convert_to_capped_with_interrupt(&request, interrupt)?;
        Ok(reply::ok())
    }

    fn insert(&self, db: &str, target: &Value, body: &Map<String, Value>) -> Result<Value> {
        let coll = collection_name("insert", target)?;
        let documents = match body.get("documents") {
            Some(Value::Array(docs)) => docs,
            Some(other) => {
                return Err(CappedError::TypeMismatch(format!(
                    "'documents' must be an array, got {}",
                    json_type_name(other)
                ))
                .into())
            }
            None => {
                return Err(
                    CappedError::FailedToParse("insert requires a 'documents' array".to_string())
                        .into(),
                )
            }
        };
        if documents.is_empty() {
            return Err(
                CappedError::invalid_options("insert requires at least one document").into(),
            );
        }

        let ns = Namespace::new(db, coll);
        ns.validate()?;
        let mut inserted = 0u64;
        for value in documents {
            if !value.is_object() {
                return Err(CappedError::TypeMismatch(format!(
                    "documents must be objects, got {}",
                    json_type_name(value)
                ))
                .into());
            }
            self.engine.insert(&ns, Document::from_json(value)?)?;
            inserted += 1;
        }
        Ok(reply::ok_with(json!({ "n": inserted })))
    }

    fn drop_collection(&self, db: &str, target: &Value, interrupt: &Interrupt) -> Result<Value> {
        let ns = Namespace::new(db, collection_name("drop", target)?);
        let dropped = self.engine.drop_collection_with_interrupt(&ns, interrupt)?;
        Ok(reply::ok_with(json!({ "ns": ns.to_string(), "dropped": dropped })))
    }

    fn drop_database(&self, db: &str) -> Value {
        if self.engine.drop_database(db) {
            reply::ok_with(json!({ "dropped": db }))
        } else {
            reply::ok()
        }
    }

    fn coll_stats(&self, db: &str, target: &Value) -> Result<Value> {
        let ns = Namespace::new(db, collection_name("collStats", target)?);
        let stats = self.engine.collection_stats(&ns)?;
        Ok(reply::ok_with(serde_json::to_value(stats)?))
    }
}

fn collection_name<'a>(command: &str, target: &'a Value) -> CappedResult<&'a str> {
    match target {
        Value::String(name) if name.is_empty() => Err(CappedError::InvalidNamespace {
            name: String::new(),
            reason: format!("{} requires a non-empty collection name", command),
        }),
        Value::String(name) => Ok(name),
        other => Err(CappedError::TypeMismatch(format!(
            "collection name has invalid type {}",
            json_type_name(other)
        ))),
    }
}

/// Reads an optional numeric field. Floats are truncated toward zero.
fn numeric_field(body: &Map<String, Value>, field: &str) -> CappedResult<Option<i64>> {
    let Some(value) = body.get(field) else {
        return Ok(None);
    };
    let Value::Number(number) = value else {
        return Err(CappedError::TypeMismatch(format!(
            "'{}' must be a number, got {}",
            field,
            json_type_name(value)
        )));
    };
    if let Some(n) = number.as_i64() {
        return Ok(Some(n));
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(Some(f.trunc() as i64)),
        _ => Err(CappedError::invalid_options(format!(
            "'{}' is out of range: {}",
            field, number
        ))),
    }
}
