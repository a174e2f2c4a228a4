//! Validation engine for completed experience records.
//!
//! Layers: syntax, schema, semantic, cross-file and presence. Only syntax,
//! schema and presence failures make a record invalid; semantic and cross-file
//! findings are count drift and are reported as warnings.

mod engine;
mod report;
pub mod schema;

pub use engine::{
    SuppliedFiles, check_cross_file, check_presence, check_schema, check_semantics, check_syntax,
    file_role, manifest_batch_files, manifest_notes_file, validate, validate_layers,
};
pub use report::{
    FileRole, FileValidation, Layer, LayerResults, Severity, ValidationIssue, ValidationReport,
};
