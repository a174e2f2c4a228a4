//! Session domain module.
//!
//! # Module Structure
//!
//! - `id`: validated session identifiers (path traversal guard)
//! - `file_kind`: session filenames and the `SessionFile` classification
//! - `model`: on-disk JSON shapes (batch, staging record, manifest)
//! - `status`: stateless status derivation from a directory listing
//! - `api`: request/response shapes of every operation
//! - `repository`: writer-side repository trait

pub mod api;
mod file_kind;
mod id;
mod model;
mod repository;
mod status;

pub use file_kind::{
    BATCH_FILE_PREFIX, BATCH_FILE_SUFFIX, BATCH_NUMBER_WIDTH, MANIFEST_FILE, NOTES_FILE,
    STAGING_FILE, SessionFile, batch_file_name, is_temp_file, parse_batch_number,
};
pub use id::SessionId;
pub use model::{
    BatchFile, ConversationRecord, ExperienceSummary, Manifest, ManifestFiles, Metadata,
    PROTOCOL_VERSION, StagingRecord,
};
pub use repository::ExperienceRepository;
pub use status::{DerivedStatus, NO_FURTHER_BATCHES, SessionState, derive_status};
