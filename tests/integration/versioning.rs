//! Integration tests for storage file versions

use super::common::TestStore;
use serde_json::json;
use tapedeck::storage::{MINIMUM_STORAGE_FILE_VERSION, STORAGE_FILE_VERSION};
use tapedeck::{FixtureStore, StorageError};

fn write(t: &TestStore, contents: &str) {
    std::fs::write(t.path(), contents).unwrap();
}

#[test]
fn test_current_version_loads() {
    let t = TestStore::new();
    write(
        &t,
        "data:\n  m:\n    f:\n    - output: 1\n      metadata:\n        latency: 0.0\nmetadata:\n  version_storage_file: 3\n",
    );
    let mut store = t.reopen();
    assert_eq!(store.storage_file_version(), STORAGE_FILE_VERSION);
    assert_eq!(store.read(&["m", "f"]).unwrap(), json!(1));
}

#[test]
fn test_minimum_version_loads_unchanged() {
    let t = TestStore::new();
    write(
        &t,
        "data:\n  m:\n    f:\n    - output: 1\n      metadata:\n        latency: 0.0\nmetadata:\n  version_storage_file: 2\n",
    );
    let store = t.reopen();
    assert_eq!(store.storage_file_version(), MINIMUM_STORAGE_FILE_VERSION);
}

/// Test that version 1 files with bare outputs are upgraded on load
#[test]
fn test_version_one_is_upgraded() {
    let t = TestStore::new();
    write(
        &t,
        "data:\n  m:\n    f:\n    - first\n    - second\nmetadata:\n  version_storage_file: 1\n",
    );
    let mut store = t.reopen();
    assert_eq!(store.storage_file_version(), STORAGE_FILE_VERSION);

    let record = store.read_record(&["m", "f"]).unwrap();
    assert_eq!(record.output, json!("first"));
    assert_eq!(record.latency(), std::time::Duration::ZERO);
    assert_eq!(store.read(&["m", "f"]).unwrap(), json!("second"));
}

#[test]
fn test_missing_version_is_incompatible() {
    let t = TestStore::new();
    write(&t, "data:\n  m:\n    f: []\nmetadata: {}\n");
    let mut store = FixtureStore::new(t.path());
    assert!(matches!(
        store.load(),
        Err(StorageError::VersionIncompatible { found: 0, .. })
    ));
}

#[test]
fn test_future_version_is_incompatible() {
    let t = TestStore::new();
    write(&t, "data: {}\nmetadata:\n  version_storage_file: 4\n");
    let mut store = FixtureStore::new(t.path());
    match store.load() {
        Err(StorageError::VersionIncompatible {
            found,
            minimum,
            current,
        }) => {
            assert_eq!(found, 4);
            assert_eq!(minimum, MINIMUM_STORAGE_FILE_VERSION);
            assert_eq!(current, STORAGE_FILE_VERSION);
        }
        other => panic!("expected VersionIncompatible, got {:?}", other),
    }
}

#[test]
fn test_dump_writes_current_version() {
    let mut t = TestStore::new();
    t.store.dump().unwrap();
    let store = t.reopen();
    assert_eq!(store.storage_file_version(), STORAGE_FILE_VERSION);
}
