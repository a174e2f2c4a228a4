//! Experience repository trait.
//!
//! Defines the writer-side operations on a session, decoupled from where the
//! session directory physically lives.

use super::api::{
    FinalizeResponse, InitRequest, InitResponse, StatusResponse, WriteBatchResponse,
    WriteNotesResponse,
};
use super::id::SessionId;
use super::model::ConversationRecord;
use crate::error::Result;
use serde_json::Value;

/// Writer-side persistence for experience sessions.
///
/// # Implementation Notes
///
/// Implementations must not cache session state between calls: every method
/// re-derives what it needs from storage, so that any call can follow a crash
/// of a previous process. No cross-writer locking is expected; two writes to
/// the same batch number race and the last one wins.
pub trait ExperienceRepository: Send + Sync {
    /// Creates the session directory (if needed) and stages the summary.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentifier` when the requested id fails the traversal guard
    /// - `Storage` when the directory or staging file cannot be written
    fn init(&self, request: InitRequest) -> Result<InitResponse>;

    /// Writes (or replaces) one numbered batch.
    ///
    /// # Errors
    ///
    /// - `InvalidBatchNumber` for batch 0
    /// - `Storage` on I/O failure; the same batch number can be retried
    fn write_batch(
        &self,
        session_id: &SessionId,
        batch_number: u32,
        records: Vec<ConversationRecord>,
    ) -> Result<WriteBatchResponse>;

    /// Writes (or replaces) the free-form notes object.
    fn write_notes(&self, session_id: &SessionId, notes: Value) -> Result<WriteNotesResponse>;

    /// Aggregates the session into its manifest.
    ///
    /// Idempotent: running it again on a completed session rebuilds the same
    /// manifest and clears any leftover staging file.
    ///
    /// # Errors
    ///
    /// - `StagingMissing` when neither a staging record nor a manifest exists
    /// - `Aggregation` when a batch file cannot be parsed (nothing is written)
    fn finalize(&self, session_id: &SessionId) -> Result<FinalizeResponse>;

    /// Reports the session's lifecycle state as derived from storage.
    fn status(&self, session_id: &SessionId) -> Result<StatusResponse>;
}
