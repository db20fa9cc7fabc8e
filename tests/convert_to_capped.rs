//! # convertToCapped Regression Tests
//!
//! End-to-end coverage of the conversion command through the public API:
//!
//! - Error codes and messages for missing databases and collections
//! - Validation order (options before lookups)
//! - Document order and oldest-first truncation after conversion
//! - Idempotent re-conversion and rejected resizing
//! - Capped write behavior after conversion
//!
//! Expected codes and messages are part of the client compatibility surface.
//! Do NOT modify them to make tests pass.

use capdb::{CommandDispatcher, ConvertRequest, Engine, ErrorCode, Namespace, StorageKind};
use serde_json::{json, Value};

const DB: &str = "convert_to_capped_nonexistent";

fn dispatcher() -> CommandDispatcher {
    CommandDispatcher::new(Engine::new())
}

fn insert_numbers(d: &CommandDispatcher, db: &str, coll: &str, range: std::ops::Range<u64>) {
    let documents: Vec<Value> = range.map(|n| json!({ "n": n })).collect();
    let reply = d.run_command(db, &json!({ "insert": coll, "documents": documents }));
    assert_eq!(reply["ok"], 1, "insert failed: {}", reply);
}

fn numbers(engine: &Engine, db: &str, coll: &str) -> Vec<u64> {
    engine
        .scan(&Namespace::new(db, coll))
        .unwrap()
        .into_iter()
        .map(|(_, doc)| doc.to_json().unwrap()["n"].as_u64().unwrap())
        .collect()
}

mod nonexistent_namespace {
    use super::*;

    #[test]
    fn database_does_not_exist() {
        let d = dispatcher();
        d.run_command(DB, &json!({ "dropDatabase": 1 }));

        let result = d.run_command(DB, &json!({ "convertToCapped": "foo", "size": 1024 }));
        assert_eq!(result["ok"], 0);
        assert_eq!(result["code"], 26);
        assert_eq!(
            result["errmsg"],
            "database convert_to_capped_nonexistent not found"
        );
    }

    #[test]
    fn database_exists_but_collection_does_not() {
        let d = dispatcher();
        d.run_command(DB, &json!({ "dropDatabase": 1 }));
        d.run_command(DB, &json!({ "insert": "coll", "documents": [{}] }));

        let result = d.run_command(DB, &json!({ "convertToCapped": "foo", "size": 1024 }));
        assert_eq!(result["ok"], 0);
        assert_eq!(result["code"], 26);
        assert_eq!(
            result["errmsg"],
            "source collection convert_to_capped_nonexistent.foo does not exist"
        );
    }

    #[test]
    fn engine_survives_repeated_failures() {
        let d = dispatcher();
        for _ in 0..3 {
            let result = d.run_command(DB, &json!({ "convertToCapped": "foo", "size": 1024 }));
            assert_eq!(result["code"], 26);
        }
        d.run_command(DB, &json!({ "insert": "foo", "documents": [{}] }));
        let result = d.run_command(DB, &json!({ "convertToCapped": "foo", "size": 1024 }));
        assert_eq!(result, json!({ "ok": 1 }));
    }

    #[test]
    fn dropped_database_reports_database_not_found() {
        let d = dispatcher();
        d.run_command(DB, &json!({ "insert": "foo", "documents": [{}] }));
        d.run_command(DB, &json!({ "dropDatabase": 1 }));
        let result = d.run_command(DB, &json!({ "convertToCapped": "foo", "size": 1024 }));
        assert_eq!(
            result["errmsg"],
            "database convert_to_capped_nonexistent not found"
        );
    }

    #[test]
    fn invalid_size_wins_over_missing_database() {
        let d = dispatcher();
        let result = d.run_command(DB, &json!({ "convertToCapped": "foo", "size": 0 }));
        assert_eq!(result["code"], ErrorCode::InvalidOptions.as_i32());
    }
}

mod conversion {
    use super::*;

    #[test]
    fn preserves_order_within_bounds() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 0..20);
        let reply = d.run_command("app", &json!({ "convertToCapped": "events", "size": 1 << 20 }));
        assert_eq!(reply["ok"], 1);
        assert_eq!(numbers(d.engine(), "app", "events"), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn truncates_to_most_recent_by_count() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 0..20);
        d.run_command(
            "app",
            &json!({ "convertToCapped": "events", "size": 1 << 20, "max": 5 }),
        );
        assert_eq!(numbers(d.engine(), "app", "events"), vec![15, 16, 17, 18, 19]);
    }

    #[test]
    fn truncates_to_most_recent_by_size() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 10..30);
        // Every {"n":NN} document is 8 bytes.
        d.run_command("app", &json!({ "convertToCapped": "events", "size": 40 }));
        assert_eq!(numbers(d.engine(), "app", "events"), vec![25, 26, 27, 28, 29]);

        let stats = d.run_command("app", &json!({ "collStats": "events" }));
        assert_eq!(stats["size"], 40);
        assert_eq!(stats["maxSize"], 40);
    }

    #[test]
    fn writes_after_conversion_evict_oldest() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 0..3);
        d.run_command(
            "app",
            &json!({ "convertToCapped": "events", "size": 4096, "max": 3 }),
        );
        insert_numbers(&d, "app", "events", 3..5);
        assert_eq!(numbers(d.engine(), "app", "events"), vec![2, 3, 4]);
    }

    #[test]
    fn same_bounds_is_idempotent() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 0..4);
        let cmd = json!({ "convertToCapped": "events", "size": 4096, "max": 10 });
        assert_eq!(d.run_command("app", &cmd), json!({ "ok": 1 }));
        assert_eq!(d.run_command("app", &cmd), json!({ "ok": 1 }));
        assert_eq!(numbers(d.engine(), "app", "events"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn different_bounds_are_rejected() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 0..4);
        d.run_command("app", &json!({ "convertToCapped": "events", "size": 4096 }));
        let reply = d.run_command(
            "app",
            &json!({ "convertToCapped": "events", "size": 4096, "max": 2 }),
        );
        assert_eq!(reply["ok"], 0);
        assert_eq!(reply["code"], ErrorCode::IllegalOperation.as_i32());
        assert_eq!(numbers(d.engine(), "app", "events"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn oversized_document_keeps_regular_collection() {
        let engine = Engine::new();
        let ns = Namespace::new("app", "events");
        engine.insert_json(&ns, &json!({ "n": 1 })).unwrap();
        engine
            .insert_json(&ns, &json!({ "blob": "z".repeat(4096) }))
            .unwrap();
        let before = engine.scan(&ns).unwrap();

        let err = engine
            .convert_to_capped(&ConvertRequest::new("app", "events", 1024))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ObjectTooLarge);
        assert_eq!(
            engine.catalog().lookup_collection(&ns).unwrap().kind(),
            StorageKind::Regular
        );
        assert_eq!(engine.scan(&ns).unwrap(), before);
    }

    #[test]
    fn unrelated_collections_untouched() {
        let d = dispatcher();
        insert_numbers(&d, "app", "events", 0..10);
        insert_numbers(&d, "app", "other", 0..10);
        d.run_command(
            "app",
            &json!({ "convertToCapped": "events", "size": 4096, "max": 2 }),
        );
        let other = d.run_command("app", &json!({ "collStats": "other" }));
        assert_eq!(other["capped"], false);
        assert_eq!(other["count"], 10);
    }
}
