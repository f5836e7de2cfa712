//! Path utilities for fixture storage files

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global storage for a custom fixture directory
static FIXTURE_DIR: OnceLock<PathBuf> = OnceLock::new();

const DEFAULT_FIXTURE_DIR: &str = "test_data";
const DEFAULT_STORAGE_FILE_NAME: &str = "storage.yaml";

/// Initialize the fixture directory with an optional custom path.
/// Only the first call has an effect.
/// If custom_path is None, uses `./test_data`.
pub fn init_fixture_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_DIR));
    if FIXTURE_DIR.set(path.clone()).is_err() {
        let existing = FIXTURE_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Fixture directory already initialized"
        );
    }
}

/// Get the fixture directory.
/// Returns the custom path if set via init_fixture_dir(), otherwise ./test_data
pub fn fixture_dir() -> PathBuf {
    FIXTURE_DIR
        .get()
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_DIR))
}

/// Get the default storage file path (<fixture_dir>/storage.yaml)
pub fn default_storage_file() -> PathBuf {
    fixture_dir().join(DEFAULT_STORAGE_FILE_NAME)
}

/// Storage file for one test: `<dir>/<module>/<test_name>.yaml`.
///
/// Rust module paths (`a::b`) become dotted directory names so every test
/// module gets a single directory.
pub fn storage_file_for(dir: &Path, module: &str, test_name: &str) -> PathBuf {
    let module = module.replace("::", ".");
    let test_name = test_name.replace("::", ".");
    dir.join(module).join(format!("{test_name}.yaml"))
}
