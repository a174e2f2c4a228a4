use crate::error::{ExrecError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default prefix of a session directory name (`session_<id>`).
pub const DEFAULT_DIR_PREFIX: &str = "session_";

fn default_dir_prefix() -> String {
    DEFAULT_DIR_PREFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration, usually loaded from `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExrecConfig {
    /// Storage root for session directories; platform data dir when unset
    #[serde(default)]
    pub storage_root: Option<PathBuf>,
    #[serde(default = "default_dir_prefix")]
    pub dir_prefix: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ExrecConfig {
    fn default() -> Self {
        Self {
            storage_root: None,
            dir_prefix: default_dir_prefix(),
            log_level: default_log_level(),
        }
    }
}

impl ExrecConfig {
    /// Checks that `dir_prefix` keeps every session directory a distinct child
    /// of the storage root.
    ///
    /// # Errors
    ///
    /// Returns `ExrecError::Config` if the prefix is empty or contains a path
    /// separator or `..`.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.dir_prefix;
        if prefix.is_empty() {
            return Err(ExrecError::config("dir_prefix must not be empty"));
        }
        if prefix.contains('/') || prefix.contains('\\') || prefix.contains("..") {
            return Err(ExrecError::config(format!(
                "dir_prefix '{}' must not contain path separators or '..'",
                prefix
            )));
        }
        Ok(())
    }
}
