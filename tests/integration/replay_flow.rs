//! Integration tests for record-or-replay and scrubbing shared fixtures

use std::cell::Cell;

use super::common::TestStore;
use serde::{Deserialize, Serialize};
use tapedeck::{call_context, record_or_replay, CallContext, ScrubConfig, StorageError, StorageMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Release {
    tag: String,
    assets: Vec<String>,
}

fn fetch_context(tag: &str) -> CallContext {
    call_context!("Releases::fetch", tag)
}

fn fetch(calls: &Cell<u32>, tag: &str) -> Release {
    calls.set(calls.get() + 1);
    Release {
        tag: tag.to_string(),
        assets: vec![format!("{tag}.tar.gz")],
    }
}

/// Test that the first run records and the second replays without calling
#[test]
fn test_record_then_replay() {
    let mut t = TestStore::new();
    let calls = Cell::new(0);
    assert_eq!(t.store.mode(), StorageMode::Write);

    let recorded: Release =
        record_or_replay(&mut t.store, &fetch_context("v1"), || fetch(&calls, "v1")).unwrap();
    let second: Release =
        record_or_replay(&mut t.store, &fetch_context("v2"), || fetch(&calls, "v2")).unwrap();
    t.store.dump().unwrap();
    assert_eq!(calls.get(), 2);

    let mut replay = t.reopen();
    let replayed: Release =
        record_or_replay(&mut replay, &fetch_context("v1"), || fetch(&calls, "v1")).unwrap();
    let replayed_second: Release =
        record_or_replay(&mut replay, &fetch_context("v2"), || fetch(&calls, "v2")).unwrap();

    assert_eq!(replayed, recorded);
    assert_eq!(replayed_second, second);
    assert_eq!(calls.get(), 2, "replay must not call the real function");
}

/// Test that replaying more calls than were recorded fails
#[test]
fn test_replay_past_recording_fails() {
    let mut t = TestStore::new();
    let calls = Cell::new(0);
    let _: Release =
        record_or_replay(&mut t.store, &fetch_context("v1"), || fetch(&calls, "v1")).unwrap();
    t.store.dump().unwrap();

    let mut replay = t.reopen();
    let _: Release =
        record_or_replay(&mut replay, &fetch_context("v1"), || fetch(&calls, "v1")).unwrap();
    let result: tapedeck::Result<Release> =
        record_or_replay(&mut replay, &fetch_context("v1"), || fetch(&calls, "v1"));
    assert!(matches!(result, Err(StorageError::Replay(_))));
    assert_eq!(calls.get(), 1);
}

/// Test that scrubbing redacts secrets before the file is shared
#[test]
fn test_scrub_before_dump() {
    let mut t = TestStore::new();
    let token = "sk-abcdefghijklmnopqrstuvwxyz";
    let _: Vec<String> = record_or_replay(&mut t.store, &fetch_context("auth"), || {
        vec![format!("Authorization: Bearer {token}")]
    })
    .unwrap();
    t.store.metadata_mut().insert("api_key", format!("api_key={token}"));

    let changed = t.store.scrub(&ScrubConfig::default_shareable());
    assert_eq!(changed, 2);
    t.store.dump().unwrap();

    let raw = std::fs::read_to_string(t.path()).unwrap();
    assert!(!raw.contains(token), "secret leaked into storage file");
    assert!(raw.contains("[REDACTED]"));
}
