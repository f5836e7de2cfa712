//! Integration tests for storing, dumping and loading records

use super::common::TestStore;
use serde_json::{json, Map};
use tapedeck::{DataType, StorageError, StorageMode};

const KEYS: [&str; 3] = ["first", "second", "third"];

/// Test that list reads replay in store order and then run dry
#[test]
fn test_list_replays_in_order_then_exhausts() {
    let mut t = TestStore::new();
    for value in ["one", "two", "three"] {
        t.store.store(&KEYS, json!(value), Map::new()).unwrap();
    }

    assert!(t.store.contains(&KEYS));
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("one"));
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("two"));
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("three"));

    assert!(!t.store.contains(&KEYS));
    match t.store.read(&KEYS) {
        Err(StorageError::StorageExhausted { keys }) => assert_eq!(keys, KEYS.to_vec()),
        other => panic!("expected StorageExhausted, got {:?}", other),
    }
}

/// Test that reading keys never stored is a missing key, not exhaustion
#[test]
fn test_read_unknown_keys_is_missing() {
    let mut t = TestStore::new();
    t.store.store(&KEYS, json!(1), Map::new()).unwrap();

    assert!(matches!(
        t.store.read(&["first", "other"]),
        Err(StorageError::MissingKey { .. })
    ));
}

/// Test that dump creates the storage file and a new store replays it
#[test]
fn test_dump_creates_file_and_reload_replays() {
    let mut t = TestStore::new();
    assert!(!t.path().exists(), "storage file should not exist before dump");

    t.store.store(&KEYS, json!({"answer": 42}), Map::new()).unwrap();
    t.store.store(&KEYS, json!([1, 2]), Map::new()).unwrap();
    t.store.dump().unwrap();
    assert!(t.path().exists(), "dump should create the storage file");

    let mut reloaded = t.reopen();
    assert_eq!(reloaded.mode(), StorageMode::Read);
    assert_eq!(reloaded.read(&KEYS).unwrap(), json!({"answer": 42}));
    assert_eq!(reloaded.read(&KEYS).unwrap(), json!([1, 2]));
}

/// Test that a JSON extension selects the JSON format
#[test]
fn test_json_storage_file() {
    let mut t = TestStore::with_file_name("storage.json");
    t.store.store(&KEYS, json!("x"), Map::new()).unwrap();
    t.store.dump().unwrap();

    let raw = std::fs::read_to_string(t.path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["data"]["first"]["second"]["third"][0]["output"], json!("x"));

    let mut reloaded = t.reopen();
    assert_eq!(reloaded.read(&KEYS).unwrap(), json!("x"));
}

/// Test that dump writes a YAML file with data and metadata sections
#[test]
fn test_yaml_layout() {
    let mut t = TestStore::new();
    t.store.store(&["m", "f"], json!("x"), Map::new()).unwrap();
    t.store.dump().unwrap();

    let raw = std::fs::read_to_string(t.path()).unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
    assert!(parsed.get("data").is_some());
    assert_eq!(
        parsed["metadata"]["version_storage_file"],
        serde_yaml::Value::from(3)
    );
    assert_eq!(
        parsed["metadata"]["key_inspect_strategy"],
        serde_yaml::Value::from("default")
    );
}

/// Test that records consumed before a dump are not written back
#[test]
fn test_dump_after_partial_replay_keeps_remaining() {
    let mut t = TestStore::new();
    t.store.store(&KEYS, json!(1), Map::new()).unwrap();
    t.store.store(&KEYS, json!(2), Map::new()).unwrap();
    assert_eq!(t.store.read(&KEYS).unwrap(), json!(1));
    t.store.dump().unwrap();

    let mut reloaded = t.reopen();
    assert_eq!(reloaded.read(&KEYS).unwrap(), json!(2));
    assert!(!reloaded.contains(&KEYS));
}

/// Test that dump, clear and load restore the table and metadata exactly
#[test]
fn test_dump_clear_load_round_trip() {
    let mut t = TestStore::new();
    t.store
        .store(&KEYS, json!({"nested": [1, -2, 3.5, null, "ünïcode"]}), Map::new())
        .unwrap();
    t.store.store(&KEYS, json!(true), Map::new()).unwrap();
    t.store.policy.data_type = DataType::Value;
    t.store.store(&["first", "value"], json!("v"), Map::new()).unwrap();
    t.store.policy.data_type = DataType::Dict;
    t.store.policy.explicit_sub_key = Some("output".to_string());
    t.store.store(&["dict"], json!(7), Map::new()).unwrap();
    t.store
        .metadata_mut()
        .insert("rpms", json!(["package1", "package2"]));
    t.store.dump().unwrap();

    let table = t.store.table().clone();
    let metadata = t.store.metadata().clone();
    t.store.clear();
    assert!(t.store.table().is_empty());
    assert!(t.store.metadata().is_empty());

    t.store.load().unwrap();
    assert_eq!(t.store.table(), &table);
    assert_eq!(t.store.metadata(), &metadata);
}
