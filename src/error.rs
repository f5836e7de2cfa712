//! Error type for fixture storage operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// A list container ran out of records: replay made more calls than were recorded.
    #[error("No more recorded values for keys {keys:?}")]
    StorageExhausted { keys: Vec<String> },
    #[error("No stored record for keys {:?}{}", .keys, sub_key_suffix(.sub_key))]
    MissingKey {
        keys: Vec<String>,
        sub_key: Option<String>,
    },
    /// Storing would replace data written under a different layout.
    #[error("Keys {keys:?} conflict with data already stored at {at:?}")]
    KeyConflict { keys: Vec<String>, at: Vec<String> },
    #[error("Stored node under {keys:?} is not a record")]
    MalformedRecord { keys: Vec<String> },
    #[error("Key strategy not supported: {0}")]
    KeyStrategyUnsupported(String),
    #[error(
        "Storage file version {found} is not supported (minimum: {minimum}, current: {current})"
    )]
    VersionIncompatible {
        found: u32,
        minimum: u32,
        current: u32,
    },
    #[error("Key sequence must not be empty")]
    EmptyKeys,
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Replay failed: {0}")]
    Replay(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn sub_key_suffix(sub_key: &Option<String>) -> String {
    match sub_key {
        Some(key) => format!(" (sub-key {key:?})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
