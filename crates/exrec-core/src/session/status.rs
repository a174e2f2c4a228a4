//! Stateless session status derivation.
//!
//! The status of a session is a pure function of its directory listing. A
//! writer that crashed after batch 3 and restarts cold asks for status and is
//! told to resume at batch 4; nothing else is consulted.

use super::file_kind::SessionFile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `next_batch` value reported for completed sessions.
pub const NO_FURTHER_BATCHES: i64 = -1;

/// Lifecycle state of a session directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Directory absent
    NotFound,
    /// Directory exists without any content files
    Initializing,
    /// Batch and/or notes files present, no manifest
    InProgress,
    /// Manifest present
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Initializing => "initializing",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything status derivation learns from one listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStatus {
    pub state: SessionState,
    /// Sorted file names present in the directory
    pub files: Vec<String>,
    /// Next batch number to write, or [`NO_FURTHER_BATCHES`] once completed
    pub next_batch: i64,
    /// Batch numbers present, ascending. Gaps are reported as-is.
    pub batch_numbers: Vec<u32>,
    pub has_notes: bool,
    pub has_staging: bool,
}

impl DerivedStatus {
    pub fn not_found() -> Self {
        Self {
            state: SessionState::NotFound,
            files: Vec::new(),
            next_batch: 1,
            batch_numbers: Vec::new(),
            has_notes: false,
            has_staging: false,
        }
    }
}

/// Derives a session's status from the names in its directory.
///
/// `entries` is `None` when the directory does not exist.
///
/// Rules:
/// - manifest present => `Completed`, next batch is the sentinel
/// - otherwise next batch = (highest batch number, or 0) + 1, gaps tolerated
/// - no content files (only the staging record or temp files) => `Initializing`
/// - anything else => `InProgress`
pub fn derive_status<I, S>(entries: Option<I>) -> DerivedStatus
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(entries) = entries else {
        return DerivedStatus::not_found();
    };

    let mut files: Vec<String> = entries.into_iter().map(|e| e.as_ref().to_string()).collect();
    files.sort();

    let mut batch_numbers = Vec::new();
    let mut has_manifest = false;
    let mut has_notes = false;
    let mut has_staging = false;
    let mut has_content = false;

    for name in &files {
        let kind = SessionFile::classify(name);
        has_content |= kind.is_content();
        match kind {
            SessionFile::Manifest => has_manifest = true,
            SessionFile::Staging => has_staging = true,
            SessionFile::Notes => has_notes = true,
            SessionFile::Batch(n) => batch_numbers.push(n),
            SessionFile::Other(_) => {}
        }
    }
    batch_numbers.sort_unstable();

    let (state, next_batch) = if has_manifest {
        (SessionState::Completed, NO_FURTHER_BATCHES)
    } else {
        let next = batch_numbers.last().map_or(0, |n| i64::from(*n)) + 1;
        if has_content {
            (SessionState::InProgress, next)
        } else {
            (SessionState::Initializing, next)
        }
    };

    DerivedStatus {
        state,
        files,
        next_batch,
        batch_numbers,
        has_notes,
        has_staging,
    }
}
