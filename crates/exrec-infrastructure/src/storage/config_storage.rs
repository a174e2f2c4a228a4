//! Config file storage.
//!
//! Reads `ExrecConfig` from TOML. A missing or empty file is not an
//! error: it yields the defaults, so a fresh install works without setup.

use exrec_core::ExrecError;
use exrec_core::config::ExrecConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// The file parsed but holds an unusable value.
    Invalid(String),
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigStorageError::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

/// Rejects prefixes that would let a directory name escape the storage root.
fn check_config(config: &ExrecConfig) -> Result<(), ConfigStorageError> {
    config.validate().map_err(|e| match e {
        ExrecError::Config(message) => ConfigStorageError::Invalid(message),
        other => ConfigStorageError::Invalid(other.to_string()),
    })
}

/// A handle to the TOML config file.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a new config storage handle.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the config file (usually `config.toml`)
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(config))`: Successfully loaded
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read, parse or check the file
    pub fn load(&self) -> Result<Option<ExrecConfig>, ConfigStorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let config: ExrecConfig = toml::from_str(&content)?;
        check_config(&config)?;
        Ok(Some(config))
    }

    /// Loads the config file, falling back to defaults when it is absent.
    pub fn load_or_default(&self) -> Result<ExrecConfig, ConfigStorageError> {
        Ok(self.load()?.unwrap_or_default())
    }
}
