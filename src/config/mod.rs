mod settings;

pub use settings::{
    StoreConfig, TomlConfig, TomlStorageConfig, ENV_DATA_TYPE, ENV_DUMP_AFTER_STORE,
    ENV_KEY_STRATEGY, ENV_MODE, ENV_STORAGE_FILE, ENV_USE_LATENCY, EXAMPLE_CONFIG,
};
