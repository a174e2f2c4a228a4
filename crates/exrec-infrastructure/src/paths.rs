//! Unified path management for exrec.
//!
//! Two concerns live here:
//! - where exrec keeps its configuration and data on this platform (`ExrecPaths`)
//! - how a session id maps to a directory under a storage root (`SessionPaths`)
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/exrec/                 # Config directory
//! └── config.toml                  # Application configuration
//!
//! ~/.local/share/exrec/            # Data directory
//! └── experiences/                 # Default storage root
//!     ├── session_<id>/
//!     │   ├── manifest.json
//!     │   ├── summary.json
//!     │   ├── conversations_001.json
//!     │   └── notes.json
//!     └── ...
//! ```

use exrec_core::config::DEFAULT_DIR_PREFIX;
use exrec_core::session::SessionId;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "exrec";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config/data directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Platform locations for exrec.
pub struct ExrecPaths;

impl ExrecPaths {
    /// Returns the exrec configuration directory (e.g. `~/.config/exrec/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the exrec data directory (e.g. `~/.local/share/exrec/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default storage root for session directories.
    pub fn default_storage_root() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("experiences"))
    }
}

/// Maps session ids to session directories under one storage root.
///
/// Pure string composition: nothing here touches the filesystem. The
/// traversal guard is `SessionId::parse`; `resolve` is the entry point for
/// raw, caller-supplied identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    root: PathBuf,
    prefix: String,
}

impl SessionPaths {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    /// Uses the default `session_` prefix.
    pub fn with_default_prefix(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_DIR_PREFIX)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of an already validated session.
    pub fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.root.join(format!("{}{}", self.prefix, session_id))
    }

    /// Validates a raw identifier and returns it with its directory.
    ///
    /// # Errors
    ///
    /// Returns `ExrecError::InvalidIdentifier` if `raw` fails the traversal guard.
    pub fn resolve(&self, raw: &str) -> exrec_core::Result<(SessionId, PathBuf)> {
        let session_id = SessionId::parse(raw)?;
        let dir = self.session_dir(&session_id);
        Ok((session_id, dir))
    }
}
