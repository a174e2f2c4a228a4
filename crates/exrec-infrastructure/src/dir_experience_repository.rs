//! Directory-backed ExperienceRepository implementation.
//!
//! One directory per session under a storage root:
//!
//! ```text
//! root/
//! └── session_<id>/
//!     ├── summary.json             # staging record, consumed by finalize
//!     ├── conversations_001.json
//!     ├── conversations_002.json
//!     ├── notes.json               # optional
//!     └── manifest.json            # written by finalize
//! ```
//!
//! Nothing is cached between calls. Every operation lists or reads the
//! directory it needs, so a process that crashed mid-session can be replaced
//! by a fresh one that simply asks for `status`.

use crate::paths::{ExrecPaths, SessionPaths};
use crate::session_lister;
use crate::storage::{AtomicJsonError, AtomicJsonFile};
use chrono::Utc;
use exrec_core::config::ExrecConfig;
use exrec_core::error::{ExrecError, Result};
use exrec_core::session::api::{
    FinalizeResponse, InitRequest, InitResponse, ListRequest, ListResponse, StatusResponse,
    WriteBatchResponse, WriteNotesResponse, expected_files,
};
use exrec_core::session::{
    BatchFile, ConversationRecord, ExperienceRepository, MANIFEST_FILE, Manifest, ManifestFiles,
    NOTES_FILE, STAGING_FILE, SessionId, StagingRecord, batch_file_name, derive_status,
    parse_batch_number,
};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Sorted names of the regular files in `dir`, or `None` if `dir` does not exist.
pub(crate) fn read_file_names(dir: &Path) -> Result<Option<Vec<String>>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ExrecError::storage(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ExrecError::storage(dir, e))?;
        let file_type = entry.file_type().map_err(|e| ExrecError::storage(entry.path(), e))?;
        if file_type.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(Some(names))
}

fn total_bytes(dir: &Path, names: &[String]) -> Result<u64> {
    let mut total = 0;
    for name in names {
        let path = dir.join(name);
        let metadata = fs::metadata(&path).map_err(|e| ExrecError::storage(&path, e))?;
        total += metadata.len();
    }
    Ok(total)
}

fn storage_error(path: &Path, err: AtomicJsonError) -> ExrecError {
    ExrecError::storage(path, err)
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Session repository over a plain directory tree.
#[derive(Debug, Clone)]
pub struct DirExperienceRepository {
    paths: SessionPaths,
}

impl DirExperienceRepository {
    pub fn new(paths: SessionPaths) -> Self {
        Self { paths }
    }

    /// Repository rooted at `root` with the default directory prefix.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(SessionPaths::with_default_prefix(root))
    }

    /// Builds a repository from the application config.
    ///
    /// # Errors
    ///
    /// Returns `ExrecError::Config` if the directory prefix is unusable, or if
    /// no storage root is configured and the platform data directory cannot
    /// be determined.
    pub fn from_config(config: &ExrecConfig) -> Result<Self> {
        config.validate()?;
        let root = match &config.storage_root {
            Some(root) => root.clone(),
            None => ExrecPaths::default_storage_root().map_err(|e| {
                ExrecError::config(format!("Failed to determine storage root: {}", e))
            })?,
        };
        Ok(Self::new(SessionPaths::new(root, config.dir_prefix.clone())))
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    pub fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.paths.session_dir(session_id)
    }

    /// Lists completed sessions under `request.root`, or under this
    /// repository's root when no override is given.
    pub fn list(&self, request: &ListRequest) -> Result<ListResponse> {
        let root = request.root.as_deref().unwrap_or_else(|| self.paths.root());
        session_lister::list_sessions(root, request.filter.as_ref())
    }

    /// Picks the staging record to finalize from, plus the `finalized_at` to stamp.
    ///
    /// A staging file wins. Without one, an existing manifest is turned back
    /// into its staging record and keeps its timestamps, so re-running
    /// finalize on a completed session rewrites the same bytes.
    fn staging_for_finalize(
        &self,
        session_id: &SessionId,
        dir: &Path,
    ) -> Result<(StagingRecord, String)> {
        let staging_path = dir.join(STAGING_FILE);
        match AtomicJsonFile::<StagingRecord>::new(staging_path.clone()).load() {
            Ok(Some(staging)) => return Ok((staging, now_rfc3339())),
            Ok(None) => {}
            Err(AtomicJsonError::JsonError(e)) => {
                return Err(ExrecError::aggregation(STAGING_FILE, e.to_string()));
            }
            Err(e) => return Err(storage_error(&staging_path, e)),
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        match AtomicJsonFile::<Manifest>::new(manifest_path.clone()).load() {
            Ok(Some(existing)) => {
                tracing::warn!(
                    "Staging record missing for session {}, rebuilding from existing manifest",
                    session_id
                );
                let finalized_at = if existing.finalized_at.is_empty() {
                    now_rfc3339()
                } else {
                    existing.finalized_at.clone()
                };
                Ok((existing.to_staging(), finalized_at))
            }
            Ok(None) => Err(ExrecError::staging_missing(session_id.as_str())),
            Err(AtomicJsonError::JsonError(e)) => {
                Err(ExrecError::aggregation(MANIFEST_FILE, e.to_string()))
            }
            Err(e) => Err(storage_error(&manifest_path, e)),
        }
    }
}

/// Record count of one batch file, read loosely: only `records` must be an array.
fn count_batch_records(dir: &Path, file_name: &str) -> Result<usize> {
    let value = AtomicJsonFile::<Value>::new(dir.join(file_name))
        .load()
        .map_err(|e| ExrecError::aggregation(file_name, e.to_string()))?
        .ok_or_else(|| ExrecError::aggregation(file_name, "file disappeared during finalize"))?;

    value
        .get("records")
        .and_then(Value::as_array)
        .map(Vec::len)
        .ok_or_else(|| ExrecError::aggregation(file_name, "missing 'records' array"))
}

impl ExperienceRepository for DirExperienceRepository {
    fn init(&self, request: InitRequest) -> Result<InitResponse> {
        let session_id = match request.session_id {
            Some(raw) => SessionId::parse(raw)?,
            None => SessionId::generate(),
        };
        let dir = self.session_dir(&session_id);

        fs::create_dir_all(&dir).map_err(|e| ExrecError::storage(&dir, e))?;

        // Re-running init keeps the original creation time.
        let staging_file = AtomicJsonFile::<StagingRecord>::new(dir.join(STAGING_FILE));
        let previous = match staging_file.load() {
            Ok(Some(existing)) => Some(existing.created_at),
            Ok(None) => AtomicJsonFile::<Manifest>::new(dir.join(MANIFEST_FILE))
                .load()
                .ok()
                .flatten()
                .map(|manifest| manifest.created_at),
            Err(e) => {
                tracing::warn!("Overwriting unreadable staging record in {:?}: {}", dir, e);
                None
            }
        };
        let resumed = previous.is_some();

        let staging = StagingRecord {
            session_id: session_id.to_string(),
            created_at: previous.unwrap_or_else(now_rfc3339),
            summary: request.summary,
            metadata: request.metadata,
        };
        staging_file
            .save(&staging)
            .map_err(|e| storage_error(staging_file.path(), e))?;

        if resumed {
            tracing::info!("Re-initialized session {} at {:?}", session_id, dir);
        } else {
            tracing::info!("Initialized session {} at {:?}", session_id, dir);
        }

        Ok(InitResponse {
            success: true,
            session_id: session_id.to_string(),
            directory: dir,
            expected_files: expected_files(),
        })
    }

    fn write_batch(
        &self,
        session_id: &SessionId,
        batch_number: u32,
        records: Vec<ConversationRecord>,
    ) -> Result<WriteBatchResponse> {
        if batch_number == 0 {
            return Err(ExrecError::InvalidBatchNumber(batch_number));
        }

        let file_path = self.session_dir(session_id).join(batch_file_name(batch_number));
        let batch = BatchFile::new(batch_number, records);
        let processed = batch.count;

        let file_size = AtomicJsonFile::<BatchFile>::new(file_path.clone())
            .save(&batch)
            .map_err(|e| storage_error(&file_path, e))?;

        tracing::debug!(
            "Wrote batch {} ({} records, {} bytes) to {:?}",
            batch_number,
            processed,
            file_size,
            file_path
        );

        Ok(WriteBatchResponse {
            file_path,
            processed,
            file_size,
        })
    }

    fn write_notes(&self, session_id: &SessionId, notes: Value) -> Result<WriteNotesResponse> {
        if !notes.is_object() {
            return Err(ExrecError::InvalidNotes(format!(
                "expected a JSON object, got {}",
                json_type_name(&notes)
            )));
        }

        let file_path = self.session_dir(session_id).join(NOTES_FILE);
        AtomicJsonFile::<Value>::new(file_path.clone())
            .save(&notes)
            .map_err(|e| storage_error(&file_path, e))?;

        tracing::debug!("Wrote notes to {:?}", file_path);
        Ok(WriteNotesResponse { file_path })
    }

    fn finalize(&self, session_id: &SessionId) -> Result<FinalizeResponse> {
        let dir = self.session_dir(session_id);
        let (staging, finalized_at) = self.staging_for_finalize(session_id, &dir)?;

        let names = read_file_names(&dir)?.unwrap_or_default();
        let mut batches: Vec<(u32, &String)> = names
            .iter()
            .filter_map(|name| parse_batch_number(name).map(|n| (n, name)))
            .collect();
        batches.sort_by_key(|(n, _)| *n);

        // Parse everything before writing anything.
        let mut total_conversations = 0;
        for (_, name) in &batches {
            total_conversations += count_batch_records(&dir, name)?;
        }

        let files = ManifestFiles {
            conversations: batches.iter().map(|(_, name)| (*name).clone()).collect(),
            notes: names
                .iter()
                .any(|name| name == NOTES_FILE)
                .then(|| NOTES_FILE.to_string()),
        };
        let manifest = Manifest::assemble(&staging, files, total_conversations, finalized_at);

        let manifest_path = dir.join(MANIFEST_FILE);
        AtomicJsonFile::<Manifest>::new(manifest_path.clone())
            .save(&manifest)
            .map_err(|e| storage_error(&manifest_path, e))?;

        let staging_path = dir.join(STAGING_FILE);
        AtomicJsonFile::<StagingRecord>::new(staging_path.clone())
            .remove()
            .map_err(|e| storage_error(&staging_path, e))?;

        let files = read_file_names(&dir)?.unwrap_or_default();
        let total_bytes = total_bytes(&dir, &files)?;

        tracing::info!(
            "Finalized session {}: {} batches, {} conversations",
            session_id,
            batches.len(),
            total_conversations
        );

        Ok(FinalizeResponse {
            directory: dir,
            manifest_path,
            total_files: files.len(),
            total_bytes,
            files,
        })
    }

    fn status(&self, session_id: &SessionId) -> Result<StatusResponse> {
        let dir = self.session_dir(session_id);
        let derived = derive_status(read_file_names(&dir)?);

        tracing::debug!("Session {} is {}", session_id, derived.state);

        Ok(StatusResponse {
            status: derived.state,
            directory: dir,
            files: derived.files,
            next_batch: derived.next_batch,
            batch_numbers: derived.batch_numbers,
            has_notes: derived.has_notes,
            has_staging: derived.has_staging,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
