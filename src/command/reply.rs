//! Reply documents.
//!
//! Success replies are `{ ok: 1, ... }`. Failures are
//! `{ ok: 0, code, codeName, errmsg }` where `code` and `errmsg` come from
//! [`CappedError`] verbatim.

use crate::error::{CappedError, ErrorCode};
use serde_json::{json, Map, Value};

pub fn ok() -> Value {
    json!({ "ok": 1 })
}

/// `{ ok: 1 }` followed by every field of `fields` (which must be an object).
pub fn ok_with(fields: Value) -> Value {
    let mut reply = Map::new();
    reply.insert("ok".to_string(), json!(1));
    if let Value::Object(map) = fields {
        reply.extend(map);
    }
    Value::Object(reply)
}

pub fn error(err: &CappedError) -> Value {
    failure(err.code(), err.to_string())
}

/// Maps a plumbing error to a reply, recovering the typed error when the
/// report wraps one.
pub fn from_report(report: &eyre::Report) -> Value {
    match report.downcast_ref::<CappedError>() {
        Some(err) => error(err),
        None => failure(ErrorCode::UnknownError, report.to_string()),
    }
}

fn failure(code: ErrorCode, errmsg: String) -> Value {
    json!({
        "ok": 0,
        "code": code.as_i32(),
        "codeName": code.name(),
        "errmsg": errmsg,
    })
}
