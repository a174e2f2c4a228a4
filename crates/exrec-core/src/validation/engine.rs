//! Layered validation of a completed experience record.
//!
//! Each `check_*` function is one layer and can be called on its own;
//! [`validate`] runs them all and folds the findings into one report. Inputs
//! are already-parsed JSON: reading and parsing files (the syntax layer proper)
//! belongs to whoever collected them.

use super::report::{FileRole, Layer, ValidationIssue, ValidationReport};
use super::schema::{self, FieldError};
use crate::session::{MANIFEST_FILE, SessionFile};
use serde_json::Value;
use std::collections::BTreeMap;

/// Supplied files, keyed by filename, excluding the manifest itself.
pub type SuppliedFiles = BTreeMap<String, Value>;

fn schema_issues(
    file: &str,
    errors: Vec<FieldError>,
) -> impl Iterator<Item = ValidationIssue> + '_ {
    errors.into_iter().map(move |e| {
        let issue = ValidationIssue::error(Layer::Schema, e.message).in_file(file);
        if e.field.is_empty() {
            issue
        } else {
            issue.at_field(e.field)
        }
    })
}

/// Batch files the manifest claims, in manifest order.
pub fn manifest_batch_files(manifest: &Value) -> Vec<String> {
    manifest
        .pointer("/files/conversations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Notes file the manifest claims, if any.
pub fn manifest_notes_file(manifest: &Value) -> Option<String> {
    manifest
        .pointer("/files/notes")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn actual_count(batch: &Value) -> Option<usize> {
    batch.get("records").and_then(Value::as_array).map(Vec::len)
}

fn declared_count(batch: &Value) -> Option<usize> {
    batch
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

/// Syntax layer, for what parsed JSON can still get wrong: notes must not be null.
pub fn check_syntax(files: &SuppliedFiles) -> Vec<ValidationIssue> {
    files
        .iter()
        .filter(|(name, value)| {
            SessionFile::classify(name) == SessionFile::Notes && value.is_null()
        })
        .map(|(name, _)| {
            let message = "notes must be a non-null JSON value";
            ValidationIssue::error(Layer::Syntax, message).in_file(name)
        })
        .collect()
}

/// Schema layer over the manifest and every supplied batch file.
///
/// Notes have no schema.
pub fn check_schema(manifest: &Value, files: &SuppliedFiles) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> =
        schema_issues(MANIFEST_FILE, schema::check_manifest(manifest)).collect();

    for (name, value) in files {
        if let SessionFile::Batch(_) = SessionFile::classify(name) {
            issues.extend(schema_issues(name, schema::check_batch(value)));
        }
    }

    issues
}

/// Semantic layer: per-batch consistency, warnings only.
///
/// - declared `count` differs from the number of records present
/// - `batch_number` differs from the number encoded in the filename
pub fn check_semantics(files: &SuppliedFiles) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (name, value) in files {
        let SessionFile::Batch(file_number) = SessionFile::classify(name) else {
            continue;
        };

        if let (Some(declared), Some(actual)) = (declared_count(value), actual_count(value)) {
            if declared != actual {
                issues.push(
                    ValidationIssue::warning(
                        Layer::Semantic,
                        format!("declared count {declared} but {actual} records present"),
                    )
                    .in_file(name)
                    .at_field("count"),
                );
            }
        }

        if let Some(number) = value.get("batch_number").and_then(Value::as_u64) {
            if number != u64::from(file_number) {
                let message =
                    format!("batch_number {number} does not match filename number {file_number}");
                issues.push(
                    ValidationIssue::warning(Layer::Semantic, message)
                        .in_file(name)
                        .at_field("batch_number"),
                );
            }
        }
    }

    issues
}

/// Cross-file layer: manifest total against the sum of actual record counts.
///
/// Only batch files the manifest names (and that were supplied) are summed;
/// missing ones are the presence layer's concern.
pub fn check_cross_file(manifest: &Value, files: &SuppliedFiles) -> Vec<ValidationIssue> {
    let Some(declared_total) = manifest.get("total_conversations").and_then(Value::as_u64) else {
        return Vec::new();
    };

    let actual_total: u64 = manifest_batch_files(manifest)
        .iter()
        .filter_map(|name| files.get(name))
        .filter_map(actual_count)
        .map(|n| n as u64)
        .sum();

    if actual_total == declared_total {
        return Vec::new();
    }

    let message = format!(
        "manifest declares {declared_total} conversations \
         but batch files contain {actual_total}"
    );
    vec![
        ValidationIssue::warning(Layer::CrossFile, message)
            .in_file(MANIFEST_FILE)
            .at_field("total_conversations"),
    ]
}

/// Presence layer: every file the manifest claims must pass `exists`.
///
/// Returns the missing filenames alongside the issues. Directory front-ends
/// test the listing rather than the parsed set, so a file that exists but
/// failed to parse is reported once, by the syntax layer.
pub fn check_presence<F>(manifest: &Value, exists: F) -> (Vec<String>, Vec<ValidationIssue>)
where
    F: Fn(&str) -> bool,
{
    let mut claimed = manifest_batch_files(manifest);
    claimed.extend(manifest_notes_file(manifest));

    let missing: Vec<String> = claimed
        .into_iter()
        .filter(|name| !exists(name.as_str()))
        .collect();

    let issues = missing
        .iter()
        .map(|name| {
            let message = format!("manifest references missing file {name}");
            ValidationIssue::error(Layer::Presence, message).in_file(name.clone())
        })
        .collect();

    (missing, issues)
}

/// Report role of a file, by name.
pub fn file_role(name: &str) -> FileRole {
    match SessionFile::classify(name) {
        SessionFile::Manifest => FileRole::Manifest,
        SessionFile::Batch(_) => FileRole::Batch,
        SessionFile::Notes => FileRole::Notes,
        SessionFile::Staging | SessionFile::Other(_) => FileRole::Other,
    }
}

/// Runs every layer over a manifest and the files it was supplied with.
pub fn validate(manifest: &Value, files: &SuppliedFiles) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_layers(&mut report, manifest, files, |name| files.contains_key(name));
    report
}

/// Runs every layer into an existing report, using `exists` for the presence
/// layer.
///
/// Front-ends that already recorded findings (unparsable files, stray files)
/// use this so everything lands in one report.
pub fn validate_layers<F>(
    report: &mut ValidationReport,
    manifest: &Value,
    files: &SuppliedFiles,
    exists: F,
) where
    F: Fn(&str) -> bool,
{
    report.track_file(MANIFEST_FILE, FileRole::Manifest);
    for (name, value) in files {
        let detail = report.track_file(name, file_role(name));
        if detail.role == FileRole::Batch {
            detail.declared_count = declared_count(value);
            detail.actual_count = actual_count(value);
        }
    }

    report.extend(check_syntax(files));
    report.extend(check_schema(manifest, files));
    report.extend(check_semantics(files));
    report.extend(check_cross_file(manifest, files));

    let (missing, issues) = check_presence(manifest, exists);
    report.missing_files.extend(missing);
    report.extend(issues);
}
