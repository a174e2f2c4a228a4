//! Request/response shapes of the writer and reader operations.
//!
//! Transport agnostic: every type is plain serde JSON so any front-end (the
//! bundled CLI, an RPC server, tests) can carry them unchanged.

use super::file_kind::{BATCH_FILE_PREFIX, BATCH_FILE_SUFFIX, MANIFEST_FILE, NOTES_FILE};
use super::model::{ExperienceSummary, Metadata};
use super::status::SessionState;
use crate::listing::{ManifestFilter, ManifestSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitRequest {
    /// Generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub summary: ExperienceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub success: bool,
    pub session_id: String,
    pub directory: PathBuf,
    /// Filename pattern -> expected cardinality
    pub expected_files: BTreeMap<String, String>,
}

/// Cardinality of each file a completed session directory holds.
pub fn expected_files() -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANIFEST_FILE.to_string(), "1".to_string()),
        (NOTES_FILE.to_string(), "0..1".to_string()),
        (
            format!("{BATCH_FILE_PREFIX}NNN{BATCH_FILE_SUFFIX}"),
            "1..".to_string(),
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteBatchResponse {
    pub file_path: PathBuf,
    pub processed: usize,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteNotesResponse {
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub directory: PathBuf,
    pub manifest_path: PathBuf,
    pub total_files: usize,
    pub total_bytes: u64,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: SessionState,
    pub directory: PathBuf,
    pub files: Vec<String>,
    /// -1 once completed
    pub next_batch: i64,
    pub batch_numbers: Vec<u32>,
    pub has_notes: bool,
    pub has_staging: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub filter: Option<ManifestFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub sessions: Vec<ManifestSummary>,
    pub warnings: Vec<String>,
}

/// Uniform failure shape for transports that must always answer with JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub kind: String,
    pub error: String,
}

impl From<&crate::error::ExrecError> for ErrorResponse {
    fn from(err: &crate::error::ExrecError) -> Self {
        Self {
            success: false,
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_request_defaults() {
        let req: InitRequest = serde_json::from_value(json!({
            "summary": {"name": "n", "context": "c"}
        }))
        .unwrap();
        assert!(req.session_id.is_none());
        assert!(req.metadata.is_empty());
        assert!(req.summary.flow.is_empty());
    }

    #[test]
    fn test_expected_files() {
        let expected = expected_files();
        assert_eq!(expected.len(), 3);
        assert_eq!(expected["manifest.json"], "1");
        assert_eq!(expected["notes.json"], "0..1");
        assert_eq!(expected["conversations_NNN.json"], "1..");
    }

    #[test]
    fn test_status_response_shape() {
        let resp = StatusResponse {
            status: SessionState::Completed,
            directory: PathBuf::from("/tmp/session_s1"),
            files: vec!["manifest.json".into()],
            next_batch: -1,
            batch_numbers: vec![],
            has_notes: false,
            has_staging: false,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], json!("completed"));
        assert_eq!(value["next_batch"], json!(-1));
    }

    #[test]
    fn test_error_response_from_error() {
        let err = crate::error::ExrecError::invalid_identifier("../../etc", "parent");
        let resp = ErrorResponse::from(&err);
        assert!(!resp.success);
        assert_eq!(resp.kind, "invalid_identifier");
    }
}
