//! Recording policy: how writes accumulate, how keys are derived, and what
//! metadata the next record carries.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::keys::KeyStrategy;

/// Metadata key holding the seconds elapsed since the previous store.
pub const LATENCY_KEY: &str = "latency";

/// Container semantics applied to every leaf of the storage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Writes append, reads pop the oldest record.
    #[default]
    List,
    /// Writes overwrite, reads are repeatable.
    Value,
    /// Writes and reads address the record under the policy's explicit sub-key.
    Dict,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Value => "value",
            Self::Dict => "dict",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "value" => Ok(Self::Value),
            "dict" => Ok(Self::Dict),
            other => Err(StorageError::Config(format!("unknown data type {other:?}"))),
        }
    }
}

/// Per-engine recording configuration.
///
/// Every field may be changed between calls; the engine reads it on each
/// store and read.
#[derive(Debug, Clone)]
pub struct RecordingPolicy {
    pub data_type: DataType,
    /// Sub-key selecting the dict entry to write or read.
    pub explicit_sub_key: Option<String>,
    /// Block reads for the recorded latency before returning.
    pub use_latency: bool,
    key_strategy: KeyStrategy,
    baseline: Instant,
    pending_metadata: Map<String, Value>,
    last_metadata: Map<String, Value>,
}

impl Default for RecordingPolicy {
    fn default() -> Self {
        Self {
            data_type: DataType::default(),
            explicit_sub_key: None,
            use_latency: false,
            key_strategy: KeyStrategy::default(),
            baseline: Instant::now(),
            pending_metadata: Map::new(),
            last_metadata: Map::new(),
        }
    }
}

impl RecordingPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    pub fn set_key_strategy(&mut self, strategy: KeyStrategy) {
        self.key_strategy = strategy;
    }

    /// Adopt the strategy a storage file was written with. Returns whether
    /// the policy changed.
    pub(crate) fn restore_key_strategy(&mut self, strategy: KeyStrategy) -> bool {
        let changed = self.key_strategy != strategy;
        self.key_strategy = strategy;
        changed
    }

    pub fn baseline(&self) -> Instant {
        self.baseline
    }

    pub fn set_baseline(&mut self, baseline: Instant) {
        self.baseline = baseline;
    }

    /// Start measuring the next latency interval from now.
    pub fn reset_baseline(&mut self) {
        self.baseline = Instant::now();
    }

    /// Metadata merged into the next stored record only.
    pub fn set_pending_metadata(&mut self, metadata: Map<String, Value>) {
        self.pending_metadata = metadata;
    }

    pub fn pending_metadata(&self) -> &Map<String, Value> {
        &self.pending_metadata
    }

    /// Metadata of the record most recently stored or read.
    pub fn last_metadata(&self) -> &Map<String, Value> {
        &self.last_metadata
    }

    /// Latency of the record most recently stored or read, in seconds.
    pub fn last_latency(&self) -> Option<f64> {
        self.last_metadata.get(LATENCY_KEY).and_then(Value::as_f64)
    }

    /// Build the metadata for a record being stored now.
    ///
    /// Caller fields first, then pending metadata, then the latency since the
    /// baseline. Moves the baseline to now and clears pending metadata.
    pub(crate) fn stamp(&mut self, caller: Map<String, Value>) -> Map<String, Value> {
        let now = Instant::now();
        let latency = now.saturating_duration_since(self.baseline).as_secs_f64();
        self.baseline = now;

        let mut metadata = caller;
        metadata.extend(std::mem::take(&mut self.pending_metadata));
        metadata.insert(LATENCY_KEY.to_string(), Value::from(latency));
        self.last_metadata = metadata.clone();
        metadata
    }

    pub(crate) fn observe_read(&mut self, metadata: &Map<String, Value>) {
        self.last_metadata = metadata.clone();
    }
}

/// Recorded latency of a record's metadata as a sleepable duration.
pub fn recorded_latency(metadata: &Map<String, Value>) -> Duration {
    metadata
        .get(LATENCY_KEY)
        .and_then(Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::ZERO)
}
