//! Record-or-replay for a single call.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Map;

use crate::error::{Result, StorageError};
use crate::keys::CallContext;
use crate::storage::FixtureStore;

/// Run `f` and record its result when the store is recording; otherwise
/// return the recorded result for `context` without calling `f`.
pub fn record_or_replay<T, F>(store: &mut FixtureStore, context: &CallContext, f: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    if store.is_write_mode() {
        let output = f();
        store.store_call(context, serde_json::to_value(&output)?, Map::new())?;
        return Ok(output);
    }

    let keys = store.keys_for(context)?;
    if !store.contains(&keys) {
        return Err(StorageError::Replay(format!(
            "nothing recorded for {} at {:?} in {}",
            context.qualname,
            keys,
            store.storage_file().display()
        )));
    }
    let value = store.read(&keys)?;
    Ok(serde_json::from_value(value)?)
}
