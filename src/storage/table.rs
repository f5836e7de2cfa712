//! Hierarchical record table.
//!
//! Each key component selects one level of nested mappings. The node at the
//! end of a key sequence is a value container whose shape depends on the data
//! type it was written with:
//!
//! - list: a sequence of records
//! - value: a single record
//! - dict: a mapping from sub-key to record
//!
//! The shape is interpreted by the data type active at read time, the same
//! way it was chosen at write time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::Record;
use crate::error::{Result, StorageError};
use crate::policy::DataType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageTable(Map<String, Value>);

impl StorageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Node stored at the end of `keys`, if the whole path exists.
    pub fn node(&self, keys: &[String]) -> Option<&Value> {
        let (first, rest) = keys.split_first()?;
        let mut node = self.0.get(first)?;
        for key in rest {
            node = node.as_object()?.get(key)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, keys: &[String]) -> Option<&mut Value> {
        let (first, rest) = keys.split_first()?;
        let mut node = self.0.get_mut(first)?;
        for key in rest {
            node = node.as_object_mut()?.get_mut(key)?;
        }
        Some(node)
    }

    /// Walk to the mapping holding the leaf, creating levels as needed.
    ///
    /// `None` when a node on the way is not a mapping.
    fn parent_mut(&mut self, path: &[String]) -> Option<&mut Map<String, Value>> {
        let mut map = &mut self.0;
        for key in path {
            map = map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()?;
        }
        Some(map)
    }

    /// Check that a write of `keys` under `data_type` fits the existing
    /// layout. Never modifies the table.
    ///
    /// A store must not replace data of another shape: a list leaf on the
    /// path of a longer key sequence, a record where a mapping is expected,
    /// or a leaf written with a different data type.
    pub fn check_insert(
        &self,
        keys: &[String],
        data_type: DataType,
        sub_key: Option<&str>,
    ) -> Result<()> {
        let Some((leaf_key, path)) = keys.split_last() else {
            return Err(StorageError::EmptyKeys);
        };
        if data_type == DataType::Dict && sub_key.is_none() {
            return Err(StorageError::Config(
                "dict data type requires an explicit sub-key".to_string(),
            ));
        }
        let conflict = |depth: usize| StorageError::KeyConflict {
            keys: keys.to_vec(),
            at: keys[..depth].to_vec(),
        };

        let mut map = &self.0;
        for (depth, key) in path.iter().enumerate() {
            let Some(node) = map.get(key) else {
                return Ok(());
            };
            match node {
                Value::Object(inner) if Record::from_node(node).is_none() => map = inner,
                _ => return Err(conflict(depth + 1)),
            }
        }

        let fits = match map.get(leaf_key) {
            None => true,
            Some(leaf) => match data_type {
                DataType::List => leaf.is_array(),
                DataType::Value => Record::from_node(leaf).is_some(),
                DataType::Dict => leaf.is_object() && Record::from_node(leaf).is_none(),
            },
        };
        if fits {
            Ok(())
        } else {
            Err(conflict(keys.len()))
        }
    }

    /// Write `record` under `keys` according to `data_type`.
    ///
    /// Fails without touching the table when [`check_insert`] does.
    ///
    /// [`check_insert`]: StorageTable::check_insert
    pub fn insert(
        &mut self,
        keys: &[String],
        record: Record,
        data_type: DataType,
        sub_key: Option<&str>,
    ) -> Result<()> {
        self.check_insert(keys, data_type, sub_key)?;
        let Some((leaf_key, path)) = keys.split_last() else {
            return Err(StorageError::EmptyKeys);
        };
        let parent = self
            .parent_mut(path)
            .ok_or_else(|| StorageError::KeyConflict {
                keys: keys.to_vec(),
                at: path.to_vec(),
            })?;

        match data_type {
            DataType::List => {
                let leaf = parent
                    .entry(leaf_key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(records) = leaf {
                    records.push(record.into_node());
                }
            }
            DataType::Value => {
                parent.insert(leaf_key.clone(), record.into_node());
            }
            DataType::Dict => {
                let leaf = parent
                    .entry(leaf_key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let (Value::Object(entries), Some(sub_key)) = (leaf, sub_key) {
                    entries.insert(sub_key.to_string(), record.into_node());
                }
            }
        }
        Ok(())
    }

    /// Resolve the record a read of `keys` returns, consuming it for lists.
    pub fn take(
        &mut self,
        keys: &[String],
        data_type: DataType,
        sub_key: Option<&str>,
    ) -> Result<Record> {
        if keys.is_empty() {
            return Err(StorageError::EmptyKeys);
        }
        let missing = || StorageError::MissingKey {
            keys: keys.to_vec(),
            sub_key: sub_key.map(str::to_string),
        };
        let malformed = || StorageError::MalformedRecord {
            keys: keys.to_vec(),
        };

        let node = self.node_mut(keys).ok_or_else(missing)?;
        match data_type {
            DataType::List => {
                let records = node.as_array_mut().ok_or_else(missing)?;
                if records.is_empty() {
                    return Err(StorageError::StorageExhausted {
                        keys: keys.to_vec(),
                    });
                }
                let head = records.remove(0);
                serde_json::from_value(head).map_err(|_| malformed())
            }
            DataType::Value => Record::from_node(node).ok_or_else(missing),
            DataType::Dict => {
                let sub_key = sub_key.ok_or_else(missing)?;
                let entry = node
                    .as_object()
                    .and_then(|entries| entries.get(sub_key))
                    .ok_or_else(missing)?;
                Record::from_node(entry).ok_or_else(malformed)
            }
        }
    }

    /// Whether a read of `keys` under `data_type` would find a record.
    pub fn contains(&self, keys: &[String], data_type: DataType, sub_key: Option<&str>) -> bool {
        let Some(node) = self.node(keys) else {
            return false;
        };
        match data_type {
            DataType::List => node.as_array().is_some_and(|records| !records.is_empty()),
            DataType::Value => Record::from_node(node).is_some(),
            DataType::Dict => match (node.as_object(), sub_key) {
                (Some(entries), Some(sub_key)) => entries
                    .get(sub_key)
                    .and_then(Record::from_node)
                    .is_some(),
                _ => false,
            },
        }
    }

    /// Visit every string in the table, outputs and metadata alike.
    pub(crate) fn for_each_string_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        for node in self.0.values_mut() {
            visit_strings(node, f);
        }
    }
}

pub(crate) fn visit_strings(node: &mut Value, f: &mut impl FnMut(&mut String)) {
    match node {
        Value::String(s) => f(s),
        Value::Array(items) => {
            for item in items {
                visit_strings(item, f);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                visit_strings(item, f);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
