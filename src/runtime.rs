//! Process-wide fixture store.
//!
//! Interception layers that cannot thread a [`FixtureStore`] through every
//! call use the global one here. It is created on first use (from the
//! environment) or explicitly with [`init`], and only goes away through
//! [`reset`].

use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::config::StoreConfig;
use crate::error::{Result, StorageError};
use crate::storage::FixtureStore;

/// Whether calls are recorded or replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Replay when the storage file already exists, record otherwise.
    #[default]
    Default,
    /// Always replay.
    Read,
    /// Always record.
    Write,
}

impl StorageMode {
    /// Turn `Default` into `Read` or `Write` for `storage_file`.
    pub fn resolve(self, storage_file: &Path) -> Self {
        match self {
            Self::Default if storage_file.exists() => Self::Read,
            Self::Default => Self::Write,
            other => other,
        }
    }
}

impl FromStr for StorageMode {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "read" | "replay" => Ok(Self::Read),
            "write" | "record" => Ok(Self::Write),
            other => Err(StorageError::Config(format!("unknown storage mode {other:?}"))),
        }
    }
}

fn store_cell() -> &'static Mutex<Option<FixtureStore>> {
    static CELL: OnceLock<Mutex<Option<FixtureStore>>> = OnceLock::new();
    CELL.get_or_init(|| Mutex::new(None))
}

/// Install `store` as the global store, returning the previous one.
pub fn init(store: FixtureStore) -> Option<FixtureStore> {
    tracing::debug!(path = %store.storage_file().display(), "initialized global fixture store");
    store_cell().lock().replace(store)
}

/// Install a global store built from environment configuration.
pub fn init_from_env() -> Result<()> {
    let store = FixtureStore::from_config(&StoreConfig::from_env())?;
    init(store);
    Ok(())
}

pub fn is_initialized() -> bool {
    store_cell().lock().is_some()
}

/// Run `f` with the global store, creating it from the environment first if
/// nothing was installed yet.
///
/// The store stays locked while `f` runs; `f` must not call back into this
/// module.
pub fn with_store<T>(f: impl FnOnce(&mut FixtureStore) -> T) -> Result<T> {
    let mut guard = store_cell().lock();
    if guard.is_none() {
        *guard = Some(FixtureStore::from_config(&StoreConfig::from_env())?);
    }
    match guard.as_mut() {
        Some(store) => Ok(f(store)),
        None => Err(StorageError::Config("global fixture store unavailable".to_string())),
    }
}

/// Remove the global store, returning it. The next use starts from scratch.
pub fn reset() -> Option<FixtureStore> {
    store_cell().lock().take()
}
