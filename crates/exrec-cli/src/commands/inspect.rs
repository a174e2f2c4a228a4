//! Reader-side commands: list and validate.

use super::input::read_json;
use super::output::print_json;
use anyhow::Result;
use exrec_core::listing::ManifestFilter;
use exrec_core::session::api::ListRequest;
use exrec_infrastructure::{DirExperienceRepository, validate_directory};
use std::path::PathBuf;

pub fn list(repo: &DirExperienceRepository, filter_source: Option<&str>) -> Result<()> {
    let filter = filter_source.map(read_json::<ManifestFilter>).transpose()?;
    let response = repo.list(&ListRequest { root: None, filter })?;
    print_json(&response)
}

/// Prints the validation report and returns whether the record is valid.
pub fn validate(
    repo: &DirExperienceRepository,
    directory: Option<PathBuf>,
    session_id: Option<&str>,
) -> Result<bool> {
    let directory = match (directory, session_id) {
        (Some(directory), _) => directory,
        (None, Some(raw)) => repo.paths().resolve(raw)?.1,
        (None, None) => anyhow::bail!("either a directory or --session-id is required"),
    };

    let report = validate_directory(&directory)?;
    print_json(&report)?;
    Ok(report.valid)
}
