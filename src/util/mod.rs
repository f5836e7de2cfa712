//! Utility modules

pub mod paths;

pub use paths::{default_storage_file, fixture_dir, init_fixture_dir, storage_file_for};
