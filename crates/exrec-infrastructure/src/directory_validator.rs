//! Validation of a session directory on disk.
//!
//! Collects and parses the files, then hands them to the validation engine.
//! Read and parse failures are findings in the report, not errors: the caller
//! always gets a report back for a directory that exists.

use crate::dir_experience_repository::read_file_names;
use exrec_core::error::Result;
use exrec_core::session::{MANIFEST_FILE, SessionFile, is_temp_file};
use exrec_core::validation::{
    FileRole, Layer, SuppliedFiles, ValidationIssue, ValidationReport, file_role,
    manifest_batch_files, manifest_notes_file, validate_layers,
};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

fn parse_file(dir: &Path, name: &str) -> std::result::Result<Value, String> {
    let content = fs::read(dir.join(name)).map_err(|e| format!("cannot read file: {}", e))?;
    serde_json::from_slice(&content).map_err(|e| format!("invalid JSON: {}", e))
}

/// Validates the session directory at `dir`.
///
/// # Errors
///
/// Returns `ExrecError::Storage` only if the directory exists but cannot be listed.
pub fn validate_directory(dir: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    let Some(names) = read_file_names(dir)? else {
        report.push(ValidationIssue::error(
            Layer::Presence,
            format!("directory {} does not exist", dir.display()),
        ));
        return Ok(report);
    };
    let present: HashSet<&str> = names.iter().map(String::as_str).collect();

    if !present.contains(MANIFEST_FILE) {
        report.missing_files.push(MANIFEST_FILE.to_string());
        let issue = ValidationIssue::error(Layer::Presence, "manifest is missing");
        report.push(issue.in_file(MANIFEST_FILE));
        return Ok(report);
    }

    let manifest = match parse_file(dir, MANIFEST_FILE) {
        Ok(manifest) => manifest,
        Err(message) => {
            report.track_file(MANIFEST_FILE, FileRole::Manifest);
            report.push(ValidationIssue::error(Layer::Syntax, message).in_file(MANIFEST_FILE));
            return Ok(report);
        }
    };

    let mut referenced: BTreeSet<String> = manifest_batch_files(&manifest).into_iter().collect();
    referenced.extend(manifest_notes_file(&manifest));

    // Only referenced files are parsed. Anything else in the directory is a
    // presence warning below and never affects validity.
    let mut files = SuppliedFiles::new();
    for name in referenced.iter().filter(|name| present.contains(name.as_str())) {
        match parse_file(dir, name) {
            Ok(value) => {
                files.insert(name.clone(), value);
            }
            Err(message) => {
                report.track_file(name, file_role(name));
                report.push(ValidationIssue::error(Layer::Syntax, message).in_file(name));
            }
        }
    }

    validate_layers(&mut report, &manifest, &files, |name| present.contains(name));

    for name in &names {
        if name == MANIFEST_FILE || referenced.contains(name) {
            continue;
        }
        let message = match SessionFile::classify(name) {
            SessionFile::Staging => "leftover staging file, finalize did not complete",
            _ if is_temp_file(name) => "leftover temporary file from an interrupted write",
            _ => "not referenced by the manifest",
        };
        report.push(ValidationIssue::warning(Layer::Presence, message).in_file(name.clone()));
    }

    tracing::debug!(
        "Validated {:?}: valid={} errors={} warnings={}",
        dir,
        report.valid,
        report.errors.len(),
        report.warnings.len()
    );

    Ok(report)
}
