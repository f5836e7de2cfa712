pub mod config;
pub mod error;
pub mod keys;
pub mod policy;
pub mod replay;
pub mod runtime;
pub mod scrub;
pub mod storage;
pub mod util;

pub use config::StoreConfig;
pub use error::{Result, StorageError};
pub use keys::{CallContext, CallSite, KeyStrategy};
pub use policy::{DataType, RecordingPolicy, LATENCY_KEY};
pub use replay::record_or_replay;
pub use runtime::StorageMode;
pub use scrub::ScrubConfig;
pub use storage::{FixtureStore, Record, StorageMetadata, StorageTable};
pub use util::storage_file_for;

#[doc(hidden)]
pub use serde_json as __serde_json;
