//! Integration tests for value and dict containers

use super::common::TestStore;
use serde_json::{json, Map};
use tapedeck::{DataType, StorageError};

const KEYS: [&str; 2] = ["svc", "call"];

#[test]
fn test_value_keeps_last_and_is_repeatable() {
    let mut t = TestStore::new();
    t.store.policy.data_type = DataType::Value;
    t.store.store(&KEYS, json!("first"), Map::new()).unwrap();
    t.store.store(&KEYS, json!("second"), Map::new()).unwrap();

    for _ in 0..3 {
        assert_eq!(t.store.read(&KEYS).unwrap(), json!("second"));
    }
    assert!(t.store.contains(&KEYS));
}

#[test]
fn test_value_survives_dump_and_load() {
    let mut t = TestStore::new();
    t.store.policy.data_type = DataType::Value;
    t.store.store(&KEYS, json!(7), Map::new()).unwrap();
    t.store.dump().unwrap();

    let mut reloaded = t.reopen();
    reloaded.policy.data_type = DataType::Value;
    assert_eq!(reloaded.read(&KEYS).unwrap(), json!(7));
    assert_eq!(reloaded.read(&KEYS).unwrap(), json!(7));
}

#[test]
fn test_dict_addresses_by_sub_key() {
    let mut t = TestStore::new();
    t.store.policy.data_type = DataType::Dict;

    t.store.policy.explicit_sub_key = Some("alpha".to_string());
    t.store.store(&KEYS, json!("a"), Map::new()).unwrap();
    t.store.policy.explicit_sub_key = Some("beta".to_string());
    t.store.store(&KEYS, json!("b"), Map::new()).unwrap();
    t.store.store(&KEYS, json!("b2"), Map::new()).unwrap();

    t.store.policy.explicit_sub_key = Some("alpha".to_string());
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("a"));
    t.store.policy.explicit_sub_key = Some("beta".to_string());
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("b2"));
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("b2"));

    t.store.policy.explicit_sub_key = Some("gamma".to_string());
    assert!(!t.store.contains(&KEYS));
    match t.store.read(&KEYS) {
        Err(StorageError::MissingKey { sub_key, .. }) => {
            assert_eq!(sub_key.as_deref(), Some("gamma"))
        }
        other => panic!("expected MissingKey, got {:?}", other),
    }
}

#[test]
fn test_dict_without_sub_key() {
    let mut t = TestStore::new();
    t.store.policy.data_type = DataType::Dict;

    assert!(matches!(
        t.store.store(&KEYS, json!("a"), Map::new()),
        Err(StorageError::Config(_))
    ));
    assert!(matches!(
        t.store.read(&KEYS),
        Err(StorageError::MissingKey { .. })
    ));
}

/// Test that a sub-key spelled like a record field is an ordinary entry
#[test]
fn test_dict_sub_key_named_output() {
    let mut t = TestStore::new();
    t.store.policy.data_type = DataType::Dict;

    t.store.policy.explicit_sub_key = Some("output".to_string());
    t.store.store(&KEYS, json!("x"), Map::new()).unwrap();
    t.store.policy.explicit_sub_key = Some("other".to_string());
    t.store.store(&KEYS, json!("y"), Map::new()).unwrap();
    t.store.dump().unwrap();

    let mut reloaded = t.reopen();
    reloaded.policy.data_type = DataType::Dict;
    for (sub_key, expected) in [("output", "x"), ("other", "y")] {
        reloaded.policy.explicit_sub_key = Some(sub_key.to_string());
        assert_eq!(reloaded.read(&KEYS).unwrap(), json!(expected));
    }
}

/// Test that switching data type on recorded keys fails instead of overwriting
#[test]
fn test_data_type_switch_keeps_recording() {
    let mut t = TestStore::new();
    t.store.store(&KEYS, json!("listed"), Map::new()).unwrap();

    t.store.policy.data_type = DataType::Value;
    assert!(matches!(
        t.store.store(&KEYS, json!("value"), Map::new()),
        Err(StorageError::KeyConflict { .. })
    ));

    t.store.policy.data_type = DataType::List;
    assert_eq!(t.store.read(&KEYS).unwrap(), json!("listed"));
}
