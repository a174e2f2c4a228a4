//! Experience record domain model.
//!
//! These are the on-disk JSON shapes of a session directory. Unknown fields
//! are accepted everywhere (no `deny_unknown_fields`) so that readers stay
//! forward compatible with newer writers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version written into every manifest.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Open, uninterpreted metadata supplied by the caller.
pub type Metadata = Map<String, Value>;

/// One exchange inside a conversation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// What the user said
    pub user: String,
    /// What the assistant answered
    pub response: String,
    /// Why it answered that way
    pub rationale: String,
    /// Any additional caller fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationRecord {
    pub fn new(
        user: impl Into<String>,
        response: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            response: response.into(),
            rationale: rationale.into(),
            extra: Map::new(),
        }
    }
}

/// Contents of a `conversations_NNN.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    pub batch_number: u32,
    /// Declared record count. Validation compares it against `records.len()`.
    pub count: usize,
    pub records: Vec<ConversationRecord>,
}

impl BatchFile {
    /// Builds a batch whose declared count matches its records.
    pub fn new(batch_number: u32, records: Vec<ConversationRecord>) -> Self {
        Self {
            batch_number,
            count: records.len(),
            records,
        }
    }

    pub fn actual_count(&self) -> usize {
        self.records.len()
    }
}

/// Writer-supplied description of the experience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceSummary {
    pub name: String,
    pub context: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub flow: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Contents of `summary.json`: everything init knows, held until finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRecord {
    pub session_id: String,
    /// RFC 3339 UTC
    pub created_at: String,
    pub summary: ExperienceSummary,
    #[serde(default)]
    pub metadata: Metadata,
}

/// The `files` map of a manifest: what finalize actually found on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFiles {
    pub conversations: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ManifestFiles {
    /// Every filename the manifest claims, batches first.
    pub fn all(&self) -> Vec<String> {
        let mut files = self.conversations.clone();
        if let Some(notes) = &self.notes {
            files.push(notes.clone());
        }
        files
    }
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub session_id: String,
    pub name: String,
    pub context: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub flow: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: String,
    #[serde(default)]
    pub finalized_at: String,
    pub files: ManifestFiles,
    pub total_conversations: usize,
}

impl Manifest {
    /// Assembles a manifest from the staged summary and a fresh directory scan.
    pub fn assemble(
        staging: &StagingRecord,
        files: ManifestFiles,
        total_conversations: usize,
        finalized_at: impl Into<String>,
    ) -> Self {
        let summary = &staging.summary;
        Self {
            version: PROTOCOL_VERSION.to_string(),
            session_id: staging.session_id.clone(),
            name: summary.name.clone(),
            context: summary.context.clone(),
            summary: summary.summary.clone(),
            flow: summary.flow.clone(),
            topics: summary.topics.clone(),
            metadata: staging.metadata.clone(),
            created_at: staging.created_at.clone(),
            finalized_at: finalized_at.into(),
            files,
            total_conversations,
        }
    }

    /// Recovers the staging record a manifest was built from.
    ///
    /// Used to repair/re-run finalize after the staging file is gone.
    pub fn to_staging(&self) -> StagingRecord {
        StagingRecord {
            session_id: self.session_id.clone(),
            created_at: self.created_at.clone(),
            summary: ExperienceSummary {
                name: self.name.clone(),
                context: self.context.clone(),
                summary: self.summary.clone(),
                flow: self.flow.clone(),
                topics: self.topics.clone(),
            },
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn staging() -> StagingRecord {
        StagingRecord {
            session_id: "s1".into(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
            summary: ExperienceSummary {
                name: "Refactor".into(),
                context: "cli".into(),
                summary: "moved things".into(),
                flow: vec!["plan".into(), "do".into()],
                topics: vec!["rust".into()],
            },
            metadata: Map::new(),
        }
    }

    #[test]
    fn test_record_preserves_extra_fields() {
        let value = json!({"user": "q", "response": "a", "rationale": "r", "tool": "grep"});
        let record: ConversationRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.extra.get("tool"), Some(&json!("grep")));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_batch_new_declares_actual_count() {
        let batch = BatchFile::new(2, vec![ConversationRecord::new("q", "a", "r"); 3]);
        assert_eq!(batch.count, 3);
        assert_eq!(batch.actual_count(), 3);
    }

    #[test]
    fn test_manifest_staging_round_trip() {
        let files = ManifestFiles {
            conversations: vec!["conversations_001.json".into()],
            notes: Some("notes.json".into()),
        };
        let manifest = Manifest::assemble(&staging(), files, 4, "2024-01-02T00:00:00+00:00");
        assert_eq!(manifest.version, PROTOCOL_VERSION);
        assert_eq!(manifest.to_staging(), staging());
        assert_eq!(
            manifest.files.all(),
            vec!["conversations_001.json".to_string(), "notes.json".to_string()]
        );
    }

    #[test]
    fn test_manifest_tolerates_unknown_fields() {
        let value = json!({
            "version": "1.0",
            "session_id": "s1",
            "name": "n",
            "context": "c",
            "created_at": "2024-01-01T00:00:00Z",
            "files": {"conversations": []},
            "total_conversations": 0,
            "added_in_v2": true
        });
        let manifest: Manifest = serde_json::from_value(value).unwrap();
        assert_eq!(manifest.files.notes, None);
    }
}
