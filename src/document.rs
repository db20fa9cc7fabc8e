//! # Documents
//!
//! A [`Document`] is an immutable, reference-counted byte payload holding the
//! serialized JSON form of a single object. Stores only ever clone the `Arc`,
//! so moving a document between stores (as conversion does) never copies its
//! bytes.
//!
//! [`RecordId`] is the per-store insertion sequence. It starts at 1 and is
//! strictly increasing, which gives every store a total insertion order.

use eyre::{ensure, Result, WrapErr};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Position of a document within the store that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const FIRST: RecordId = RecordId(1);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> RecordId {
        RecordId(self.0 + 1)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    bytes: Arc<[u8]>,
}

impl Document {
    /// Encodes a JSON object. Scalars and arrays are not documents.
    pub fn from_json(value: &Value) -> Result<Self> {
        ensure!(
            value.is_object(),
            "document must be an object, got {}",
            json_type_name(value)
        );
        let bytes = serde_json::to_vec(value).wrap_err("failed to encode document")?;
        Ok(Self {
            bytes: bytes.into(),
        })
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::from_slice(&self.bytes).wrap_err("failed to decode document")
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// True when both handles point at the same payload allocation.
    pub fn shares_payload(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.bytes) {
            Ok(s) => write!(f, "Document({})", s),
            Err(_) => write!(f, "Document(<{} bytes>)", self.bytes.len()),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(Document::from_json(&json!([1, 2])).is_err());
        assert!(Document::from_json(&json!("x")).is_err());
        assert!(Document::from_json(&json!({})).is_ok());
    }

    #[test]
    fn size_is_encoded_length() {
        let doc = Document::from_json(&json!({"a": 1})).unwrap();
        assert_eq!(doc.size_bytes(), br#"{"a":1}"#.len());
        assert_eq!(doc.to_json().unwrap(), json!({"a": 1}));
    }

    #[test]
    fn clone_shares_payload() {
        let doc = Document::from_json(&json!({"k": "v"})).unwrap();
        let copy = doc.clone();
        assert!(doc.shares_payload(&copy));

        let other = Document::from_json(&json!({"k": "v"})).unwrap();
        assert_eq!(doc, other);
        assert!(!doc.shares_payload(&other));
    }

    #[test]
    fn record_ids_are_ordered() {
        let a = RecordId::FIRST;
        let b = a.next();
        assert!(a < b);
        assert_eq!(b.get(), 2);
        assert_eq!(b.to_string(), "2");
    }
}
