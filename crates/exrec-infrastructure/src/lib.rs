//! Filesystem implementation of the exrec experience store.
//!
//! - `paths`: platform locations and session directory naming
//! - `storage`: atomic JSON writes and the TOML config file
//! - `dir_experience_repository`: the writer-side repository
//! - `session_lister`: discovery of completed sessions
//! - `directory_validator`: validation of a session directory on disk

pub mod dir_experience_repository;
pub mod directory_validator;
pub mod paths;
pub mod session_lister;
pub mod storage;

pub use crate::dir_experience_repository::DirExperienceRepository;
pub use crate::directory_validator::validate_directory;
pub use crate::paths::{ExrecPaths, SessionPaths};
pub use crate::session_lister::list_sessions;
