use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keys::KeyStrategy;

/// Format version written by this crate.
pub const STORAGE_FILE_VERSION: u32 = 3;
/// Oldest version that loads without an upgrade step.
pub const MINIMUM_STORAGE_FILE_VERSION: u32 = 2;

pub const VERSION_KEY: &str = "version_storage_file";
pub const KEY_STRATEGY_KEY: &str = "key_inspect_strategy";

/// File-level metadata stored next to the record table.
///
/// Besides the version and key strategy stamped on dump, callers may keep
/// arbitrary fields here (package lists, environment names); they are written
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageMetadata(Map<String, Value>);

impl StorageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Format version of the file this came from; 0 when never stamped.
    pub fn version(&self) -> u32 {
        self.0
            .get(VERSION_KEY)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }

    pub fn set_version(&mut self, version: u32) {
        self.0.insert(VERSION_KEY.to_string(), Value::from(version));
    }

    /// Strategy recorded in the file. `None` when absent or unrecognized.
    pub fn key_strategy(&self) -> Option<KeyStrategy> {
        self.0
            .get(KEY_STRATEGY_KEY)
            .and_then(Value::as_str)
            .and_then(KeyStrategy::from_identifier)
    }

    /// Stamp the current format version and the active strategy.
    pub fn stamp(&mut self, strategy: KeyStrategy) {
        self.set_version(STORAGE_FILE_VERSION);
        self.0.insert(
            KEY_STRATEGY_KEY.to_string(),
            Value::from(strategy.identifier()),
        );
    }
}
