use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::policy::{recorded_latency, LATENCY_KEY};

/// One recorded outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Record {
    pub output: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Record {
    pub fn new(output: Value, metadata: Map<String, Value>) -> Self {
        Self { output, metadata }
    }

    /// Wrap an output recorded without metadata.
    pub fn bare(output: Value) -> Self {
        let mut metadata = Map::new();
        metadata.insert(LATENCY_KEY.to_string(), Value::from(0.0));
        Self { output, metadata }
    }

    pub fn latency(&self) -> Duration {
        recorded_latency(&self.metadata)
    }

    /// Parse a table node as a record, if it has the shape [`into_node`]
    /// writes: an `output` and a `metadata` mapping, nothing else.
    ///
    /// [`into_node`]: Record::into_node
    pub fn from_node(node: &Value) -> Option<Self> {
        let obj = node.as_object()?;
        if !obj.contains_key("output") || !obj.get("metadata").is_some_and(Value::is_object) {
            return None;
        }
        Self::deserialize(node).ok()
    }

    pub fn into_node(self) -> Value {
        let mut obj = Map::new();
        obj.insert("output".to_string(), self.output);
        obj.insert("metadata".to_string(), Value::Object(self.metadata));
        Value::Object(obj)
    }
}
