//! Storage layer for atomic file operations.

mod atomic_json;
mod config_storage;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile, to_pretty_bytes};
pub use config_storage::{ConfigStorage, ConfigStorageError};
