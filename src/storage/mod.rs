//! Persistent, versioned record storage.
//!
//! [`FixtureStore`] keeps recorded outputs in a nested table addressed by key
//! sequences and moves it to and from a YAML or JSON storage file.

pub mod engine;
pub mod format;
pub mod metadata;
pub mod record;
pub mod table;

pub use engine::FixtureStore;
pub use format::{StorageDocument, StorageFormat};
pub use metadata::{
    StorageMetadata, KEY_STRATEGY_KEY, MINIMUM_STORAGE_FILE_VERSION, STORAGE_FILE_VERSION,
    VERSION_KEY,
};
pub use record::Record;
pub use table::StorageTable;
