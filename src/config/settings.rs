use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::keys::KeyStrategy;
use crate::policy::DataType;
use crate::runtime::StorageMode;
use crate::util::paths::default_storage_file;

pub const ENV_STORAGE_FILE: &str = "TAPEDECK_STORAGE_FILE";
pub const ENV_DUMP_AFTER_STORE: &str = "TAPEDECK_DUMP_AFTER_STORE";
pub const ENV_DATA_TYPE: &str = "TAPEDECK_DATA_TYPE";
pub const ENV_KEY_STRATEGY: &str = "TAPEDECK_KEY_STRATEGY";
pub const ENV_USE_LATENCY: &str = "TAPEDECK_USE_LATENCY";
pub const ENV_MODE: &str = "TAPEDECK_MODE";

/// Example configuration file contents
pub const EXAMPLE_CONFIG: &str = include_str!("tapedeck.toml.example");

/// Fixture store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Storage file the table is loaded from and dumped to
    pub storage_file: PathBuf,
    /// Dump after every store
    pub dump_after_store: bool,
    /// Container semantics for stored values
    pub data_type: DataType,
    /// Key derivation strategy for call contexts. `None` keeps the strategy
    /// recorded in the storage file.
    pub key_strategy: Option<KeyStrategy>,
    /// Replay recorded latency on read
    pub use_latency: bool,
    /// Record or replay
    pub mode: StorageMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_file: default_storage_file(),
            dump_after_store: false,
            data_type: DataType::List,
            key_strategy: None,
            use_latency: false,
            mode: StorageMode::Default,
        }
    }
}

/// TOML representation of the `[storage]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlStorageConfig {
    pub file: Option<PathBuf>,
    pub dump_after_store: Option<bool>,
    pub data_type: Option<DataType>,
    pub key_strategy: Option<KeyStrategy>,
    pub use_latency: Option<bool>,
    pub mode: Option<StorageMode>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub storage: Option<TomlStorageConfig>,
}

impl StoreConfig {
    /// Defaults overridden by the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_with(|name| std::env::var(name).ok());
        config
    }

    /// Load `path` (if it exists) over the defaults, then apply the environment.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::from_toml_str(&contents)
                .with_context(|| format!("invalid config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse TOML config contents over the defaults. The environment is not consulted.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Self::default();
        if let Some(storage) = toml_config.storage {
            config.merge(storage);
        }
        Ok(config)
    }

    fn merge(&mut self, storage: TomlStorageConfig) {
        if let Some(file) = storage.file {
            self.storage_file = file;
        }
        if let Some(dump_after_store) = storage.dump_after_store {
            self.dump_after_store = dump_after_store;
        }
        if let Some(data_type) = storage.data_type {
            self.data_type = data_type;
        }
        if let Some(key_strategy) = storage.key_strategy {
            self.key_strategy = Some(key_strategy);
        }
        if let Some(use_latency) = storage.use_latency {
            self.use_latency = use_latency;
        }
        if let Some(mode) = storage.mode {
            self.mode = mode;
        }
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(file) = lookup(ENV_STORAGE_FILE).filter(|v| !v.trim().is_empty()) {
            self.storage_file = PathBuf::from(file);
        }
        if let Some(raw) = lookup(ENV_DUMP_AFTER_STORE) {
            self.dump_after_store = parse_flag(&raw);
        }
        if let Some(raw) = lookup(ENV_USE_LATENCY) {
            self.use_latency = parse_flag(&raw);
        }
        if let Some(raw) = lookup(ENV_DATA_TYPE) {
            match raw.parse() {
                Ok(data_type) => self.data_type = data_type,
                Err(err) => tracing::warn!(var = ENV_DATA_TYPE, error = %err, "ignoring override"),
            }
        }
        if let Some(raw) = lookup(ENV_KEY_STRATEGY) {
            match raw.parse() {
                Ok(strategy) => self.key_strategy = Some(strategy),
                Err(err) => tracing::warn!(var = ENV_KEY_STRATEGY, error = %err, "ignoring override"),
            }
        }
        if let Some(raw) = lookup(ENV_MODE) {
            match raw.parse() {
                Ok(mode) => self.mode = mode,
                Err(err) => tracing::warn!(var = ENV_MODE, error = %err, "ignoring override"),
            }
        }
    }

    pub fn with_storage_file(mut self, storage_file: impl Into<PathBuf>) -> Self {
        self.storage_file = storage_file.into();
        self
    }

    pub fn with_mode(mut self, mode: StorageMode) -> Self {
        self.mode = mode;
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "1" || raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes")
}
