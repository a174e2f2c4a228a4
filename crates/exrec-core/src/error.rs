//! Error types for exrec.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A shared error type for the whole experience store.
///
/// Variants map one-to-one onto the failure classes a caller has to react to:
/// a rejected identifier is never retryable, a storage failure always is, and
/// an aggregation failure means a batch file on disk has to be rewritten
/// before finalize can succeed.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExrecError {
    /// Session identifier rejected by the path traversal guard
    #[error("Invalid session identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// Batch numbers start at 1
    #[error("Invalid batch number {0}: batch numbers start at 1")]
    InvalidBatchNumber(u32),

    /// Notes payload is not a JSON object
    #[error("Invalid notes payload: {0}")]
    InvalidNotes(String),

    /// Filesystem failure (permissions, disk full, missing parent, ...)
    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },

    /// Finalize called before init, or the staging record was already consumed
    #[error("Staging record missing for session '{session_id}'")]
    StagingMissing { session_id: String },

    /// A session file exists but could not be aggregated during finalize
    #[error("Aggregation failed on {file}: {message}")]
    Aggregation { file: String, message: String },

    /// Manifest or batch file failed its required-field checks
    #[error("Schema validation failed for {file} ({} errors)", .errors.len())]
    Schema { file: String, errors: Vec<String> },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExrecError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn invalid_identifier(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Storage error from an I/O failure on `path`.
    pub fn storage(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn staging_missing(session_id: impl Into<String>) -> Self {
        Self::StagingMissing {
            session_id: session_id.into(),
        }
    }

    /// Creates an Aggregation error naming the offending file.
    pub fn aggregation(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Aggregation {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn schema(file: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Schema {
            file: file.into(),
            errors,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    pub fn is_staging_missing(&self) -> bool {
        matches!(self, Self::StagingMissing { .. })
    }

    pub fn is_aggregation(&self) -> bool {
        matches!(self, Self::Aggregation { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Stable, machine-readable name of the variant.
    ///
    /// Used by transports that report failures as structured results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::InvalidBatchNumber(_) => "invalid_batch_number",
            Self::InvalidNotes(_) => "invalid_notes",
            Self::Storage { .. } => "storage_error",
            Self::StagingMissing { .. } => "staging_missing",
            Self::Aggregation { .. } => "aggregation_error",
            Self::Schema { .. } => "schema_error",
            Self::Serialization { .. } => "serialization_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Whether retrying the same call can succeed without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ExrecError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            path: String::from("<unknown>"),
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ExrecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ExrecError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ExrecError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ExrecError>`.
pub type Result<T> = std::result::Result<T, ExrecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(
            ExrecError::invalid_identifier("../x", "parent").kind(),
            "invalid_identifier"
        );
        assert_eq!(ExrecError::staging_missing("s1").kind(), "staging_missing");
        assert_eq!(
            ExrecError::aggregation("conversations_001.json", "bad").kind(),
            "aggregation_error"
        );
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ExrecError = io.into();
        assert!(err.is_storage());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_aggregation_message_names_file() {
        let err = ExrecError::aggregation("conversations_002.json", "expected value");
        assert!(err.to_string().contains("conversations_002.json"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_schema_error_counts() {
        let err = ExrecError::schema("manifest.json", vec!["a".into(), "b".into()]);
        assert_eq!(
            err.to_string(),
            "Schema validation failed for manifest.json (2 errors)"
        );
    }
}
