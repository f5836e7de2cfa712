use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::format::{read_document, upgrade, write_document};
use super::metadata::StorageMetadata;
use super::record::Record;
use super::table::StorageTable;
use crate::config::StoreConfig;
use crate::error::{Result, StorageError};
use crate::keys::CallContext;
use crate::policy::RecordingPolicy;
use crate::runtime::StorageMode;
use crate::scrub::ScrubConfig;

/// Persistent record store backing record/replay.
///
/// Values are stored under key sequences and read back according to the
/// active [`RecordingPolicy`]. The table lives in memory; [`dump`] and
/// [`load`] move it to and from `storage_file`.
///
/// [`dump`]: FixtureStore::dump
/// [`load`]: FixtureStore::load
#[derive(Debug)]
pub struct FixtureStore {
    storage_file: PathBuf,
    mode: StorageMode,
    /// Write the storage file after every successful store.
    pub dump_after_store: bool,
    pub policy: RecordingPolicy,
    table: StorageTable,
    metadata: StorageMetadata,
}

impl FixtureStore {
    /// Create an empty store for `storage_file` without touching the disk.
    ///
    /// The mode starts as [`StorageMode::Default`]: replay when the file
    /// already exists, record otherwise.
    pub fn new(storage_file: impl Into<PathBuf>) -> Self {
        let storage_file = storage_file.into();
        let mode = StorageMode::Default.resolve(&storage_file);
        Self {
            storage_file,
            mode,
            dump_after_store: false,
            policy: RecordingPolicy::new(),
            table: StorageTable::new(),
            metadata: StorageMetadata::new(),
        }
    }

    /// Create a store for `storage_file` and load it if it exists.
    pub fn open(storage_file: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(storage_file);
        store.load_if_exists()?;
        Ok(store)
    }

    /// Build a store from configuration, loading the file when replaying.
    ///
    /// A configured key strategy wins over the one recorded in the file.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let mut store = Self::new(&config.storage_file);
        store.mode = config.mode.resolve(&config.storage_file);
        store.dump_after_store = config.dump_after_store;
        store.policy.data_type = config.data_type;
        store.policy.use_latency = config.use_latency;
        if !store.is_write_mode() {
            store.load_if_exists()?;
        }
        if let Some(strategy) = config.key_strategy {
            store.policy.set_key_strategy(strategy);
        }
        Ok(store)
    }

    pub fn storage_file(&self) -> &Path {
        &self.storage_file
    }

    /// Point the store at another file, dropping the in-memory state.
    ///
    /// `mode` is resolved against the new path; in replay mode an existing
    /// file is loaded immediately.
    pub fn set_storage_file(&mut self, storage_file: impl Into<PathBuf>, mode: StorageMode) -> Result<()> {
        self.storage_file = storage_file.into();
        self.mode = mode.resolve(&self.storage_file);
        self.clear();
        if !self.is_write_mode() {
            self.load_if_exists()?;
        }
        Ok(())
    }

    /// Resolved mode: always [`StorageMode::Read`] or [`StorageMode::Write`].
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: StorageMode) {
        self.mode = mode.resolve(&self.storage_file);
    }

    pub fn is_write_mode(&self) -> bool {
        self.mode == StorageMode::Write
    }

    /// Store `output` under `keys` with the active data type.
    ///
    /// `metadata` is merged with the policy's pending metadata and the latency
    /// since the previous store. Keys that would overwrite data stored with
    /// another layout fail with [`StorageError::KeyConflict`] and change
    /// nothing.
    pub fn store<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        output: Value,
        metadata: Map<String, Value>,
    ) -> Result<()> {
        let keys = owned_keys(keys);
        let data_type = self.policy.data_type;
        let sub_key = self.policy.explicit_sub_key.clone();
        // reject before the policy consumes pending metadata
        self.table
            .check_insert(&keys, data_type, sub_key.as_deref())?;

        let record = Record::new(output, self.policy.stamp(metadata));
        tracing::trace!(keys = ?keys, data_type = %data_type, latency = ?record.latency(), "store");
        self.table
            .insert(&keys, record, data_type, sub_key.as_deref())?;

        if self.dump_after_store {
            self.dump()?;
        }
        Ok(())
    }

    /// Read the output stored under `keys`.
    pub fn read<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<Value> {
        self.read_record(keys).map(|record| record.output)
    }

    /// Read the whole record stored under `keys`.
    ///
    /// List containers give up their oldest record. With latency replay
    /// enabled this blocks the calling thread for the recorded latency.
    pub fn read_record<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<Record> {
        let keys = owned_keys(keys);
        let data_type = self.policy.data_type;
        let record = self.table.take(
            &keys,
            data_type,
            self.policy.explicit_sub_key.as_deref(),
        )?;
        self.policy.observe_read(&record.metadata);

        let latency = record.latency();
        tracing::trace!(keys = ?keys, data_type = %data_type, latency = ?latency, "read");
        if self.policy.use_latency && !latency.is_zero() {
            std::thread::sleep(latency);
        }
        Ok(record)
    }

    /// Whether a read of `keys` would succeed. Never consumes or blocks.
    pub fn contains<K: AsRef<str>>(&self, keys: &[K]) -> bool {
        self.table.contains(
            &owned_keys(keys),
            self.policy.data_type,
            self.policy.explicit_sub_key.as_deref(),
        )
    }

    /// Keys the active strategy derives for `context`.
    pub fn keys_for(&self, context: &CallContext) -> Result<Vec<String>> {
        self.policy.key_strategy().derive_keys(context)
    }

    pub fn store_call(
        &mut self,
        context: &CallContext,
        output: Value,
        metadata: Map<String, Value>,
    ) -> Result<()> {
        let keys = self.keys_for(context)?;
        self.store(&keys, output, metadata)
    }

    pub fn read_call(&mut self, context: &CallContext) -> Result<Value> {
        let keys = self.keys_for(context)?;
        self.read(&keys)
    }

    pub fn contains_call(&self, context: &CallContext) -> bool {
        self.keys_for(context)
            .map(|keys| self.contains(&keys))
            .unwrap_or(false)
    }

    /// Replace the in-memory state with the storage file's contents.
    ///
    /// Old files are upgraded; files that cannot be upgraded are rejected and
    /// leave the current state untouched. The key strategy recorded in the
    /// file becomes the active one.
    pub fn load(&mut self) -> Result<()> {
        let mut document = read_document(&self.storage_file)?;
        upgrade(&mut document)?;

        if let Some(strategy) = document.metadata.key_strategy() {
            if self.policy.restore_key_strategy(strategy) {
                tracing::debug!(strategy = %strategy, "restored key strategy from storage file");
            }
        }
        self.table = document.data;
        self.metadata = document.metadata;
        tracing::debug!(
            path = %self.storage_file.display(),
            version = self.metadata.version(),
            "loaded storage file"
        );
        Ok(())
    }

    /// Load the storage file if there is one. Returns whether it was loaded.
    pub fn load_if_exists(&mut self) -> Result<bool> {
        if !self.storage_file.exists() {
            tracing::debug!(path = %self.storage_file.display(), "no storage file to load");
            return Ok(false);
        }
        self.load()?;
        Ok(true)
    }

    /// Write the table and metadata to the storage file.
    pub fn dump(&mut self) -> Result<()> {
        self.metadata.stamp(self.policy.key_strategy());
        write_document(&self.storage_file, &self.table, &self.metadata)?;
        tracing::debug!(path = %self.storage_file.display(), "dumped storage file");
        Ok(())
    }

    pub fn table(&self) -> &StorageTable {
        &self.table
    }

    pub fn metadata(&self) -> &StorageMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut StorageMetadata {
        &mut self.metadata
    }

    /// Replace the caller-visible metadata. Version and strategy are stamped
    /// again on the next dump.
    pub fn set_metadata(&mut self, metadata: Map<String, Value>) {
        self.metadata = StorageMetadata::from_map(metadata);
    }

    /// Version of the loaded or last dumped file; 0 before either happened.
    pub fn storage_file_version(&self) -> u32 {
        self.metadata.version()
    }

    /// Drop every record and all metadata. The policy is kept.
    pub fn clear(&mut self) {
        self.table.clear();
        self.metadata.clear();
    }

    /// Redact secrets from stored outputs and metadata. Returns how many
    /// strings changed.
    pub fn scrub(&mut self, scrub: &ScrubConfig) -> usize {
        scrub.scrub_table(&mut self.table) + scrub.scrub_metadata(&mut self.metadata)
    }
}

fn owned_keys<K: AsRef<str>>(keys: &[K]) -> Vec<String> {
    keys.iter().map(|key| key.as_ref().to_string()).collect()
}
