//! Discovery of completed sessions under a storage root.
//!
//! One bad directory never fails the listing: a session without a manifest,
//! or with a manifest that does not parse or fails its schema, is skipped and
//! reported as a warning.

use exrec_core::error::{ExrecError, Result};
use exrec_core::listing::{ManifestFilter, ManifestSummary};
use exrec_core::session::api::ListResponse;
use exrec_core::session::{MANIFEST_FILE, Manifest};
use exrec_core::validation::schema;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads one session's manifest into a summary.
fn read_summary(dir: &Path) -> Result<ManifestSummary> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let content = fs::read(&manifest_path).map_err(|e| ExrecError::storage(&manifest_path, e))?;
    let value: Value = serde_json::from_slice(&content)?;

    let errors = schema::check_manifest(&value);
    if !errors.is_empty() {
        let details = errors.iter().map(ToString::to_string).collect();
        return Err(ExrecError::schema(MANIFEST_FILE, details));
    }

    let manifest: Manifest = serde_json::from_value(value)?;
    Ok(ManifestSummary::from_manifest(&manifest, dir.to_path_buf()))
}

/// Listing warning for a session whose manifest could not be summarized.
fn skip_warning(dir: &Path, err: &ExrecError) -> String {
    match err {
        ExrecError::Schema { errors, .. } => {
            format!("{}: {}: {}", dir.display(), err, errors.join("; "))
        }
        _ => format!("{}: {}", dir.display(), err),
    }
}

/// Lists completed sessions directly under `root`, newest first.
///
/// A missing root yields an empty listing.
///
/// # Errors
///
/// Returns `ExrecError::Storage` only if `root` exists but cannot be read.
pub fn list_sessions(root: &Path, filter: Option<&ManifestFilter>) -> Result<ListResponse> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Storage root {:?} does not exist, nothing to list", root);
            return Ok(ListResponse::default());
        }
        Err(e) => return Err(ExrecError::storage(root, e)),
    };

    let mut sessions = Vec::new();
    let mut warnings = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warnings.push(format!("{}: cannot read entry: {}", root.display(), e));
                continue;
            }
        };
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }

        if !dir.join(MANIFEST_FILE).exists() {
            tracing::debug!("Skipping {:?}: not finalized", dir);
            warnings.push(format!("{}: no manifest, session not finalized", dir.display()));
            continue;
        }

        match read_summary(&dir) {
            Ok(summary) => {
                if filter.is_none_or(|f| f.matches(&summary)) {
                    sessions.push(summary);
                }
            }
            Err(err) => {
                let warning = skip_warning(&dir, &err);
                tracing::warn!("Skipping session ({}): {}", err.kind(), warning);
                warnings.push(warning);
            }
        }
    }

    sessions.sort_by(|a, b| {
        b.created_at_utc()
            .cmp(&a.created_at_utc())
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    warnings.sort();

    tracing::debug!(
        "Listed {} sessions under {:?} ({} warnings)",
        sessions.len(),
        root,
        warnings.len()
    );

    Ok(ListResponse { sessions, warnings })
}
