//! Session file naming.
//!
//! All filename knowledge lives here. Everything else classifies a directory
//! entry once with [`SessionFile::classify`] and dispatches on the variant.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Final aggregate; its presence marks a session completed.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Transient staging record written by init, removed by finalize.
pub const STAGING_FILE: &str = "summary.json";
/// Optional free-form notes.
pub const NOTES_FILE: &str = "notes.json";

pub const BATCH_FILE_PREFIX: &str = "conversations_";
pub const BATCH_FILE_SUFFIX: &str = ".json";
/// Zero-padding width of the batch number in a batch filename.
pub const BATCH_NUMBER_WIDTH: usize = 3;

static BATCH_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^conversations_([0-9]+)\.json$").expect("valid batch file regex"));

/// Returns the filename for batch `batch_number`, e.g. `conversations_001.json`.
///
/// Numbers wider than the padding simply widen (`conversations_1000.json`), so
/// the numeric sort used by finalize stays correct past 999.
pub fn batch_file_name(batch_number: u32) -> String {
    format!(
        "{BATCH_FILE_PREFIX}{batch_number:0width$}{BATCH_FILE_SUFFIX}",
        width = BATCH_NUMBER_WIDTH
    )
}

/// Parses the batch number out of a batch filename.
pub fn parse_batch_number(file_name: &str) -> Option<u32> {
    BATCH_FILE_RE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Returns true for the `.<name>.<random>.tmp` files left by an interrupted atomic write.
pub fn is_temp_file(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.ends_with(".tmp")
}

/// The kind of a file inside a session directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionFile {
    Manifest,
    Staging,
    Batch(u32),
    Notes,
    /// Anything else; carried by name so callers can report it.
    Other(String),
}

impl SessionFile {
    /// Classifies a directory entry by its filename.
    pub fn classify(file_name: &str) -> Self {
        match file_name {
            MANIFEST_FILE => Self::Manifest,
            STAGING_FILE => Self::Staging,
            NOTES_FILE => Self::Notes,
            other => match parse_batch_number(other) {
                Some(n) => Self::Batch(n),
                None => Self::Other(other.to_string()),
            },
        }
    }

    /// The canonical filename for this kind.
    ///
    /// For batches this is the zero-padded form; a batch file written by hand
    /// as `conversations_7.json` classifies as `Batch(7)` but its canonical
    /// name is `conversations_007.json`.
    pub fn file_name(&self) -> String {
        match self {
            Self::Manifest => MANIFEST_FILE.to_string(),
            Self::Staging => STAGING_FILE.to_string(),
            Self::Notes => NOTES_FILE.to_string(),
            Self::Batch(n) => batch_file_name(*n),
            Self::Other(name) => name.clone(),
        }
    }

    /// Whether the file is session content as opposed to a writer-internal artifact.
    pub fn is_content(&self) -> bool {
        match self {
            Self::Batch(_) | Self::Notes | Self::Manifest => true,
            Self::Staging => false,
            Self::Other(name) => !is_temp_file(name),
        }
    }

    pub fn batch_number(&self) -> Option<u32> {
        match self {
            Self::Batch(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for SessionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_file_name_padding() {
        assert_eq!(batch_file_name(1), "conversations_001.json");
        assert_eq!(batch_file_name(42), "conversations_042.json");
        assert_eq!(batch_file_name(999), "conversations_999.json");
        assert_eq!(batch_file_name(1000), "conversations_1000.json");
    }

    #[test]
    fn test_lexicographic_matches_numeric_below_1000() {
        let mut names: Vec<String> = [10, 2, 100, 1, 99]
            .iter()
            .map(|n| batch_file_name(*n))
            .collect();
        names.sort();
        let numbers: Vec<u32> = names.iter().filter_map(|n| parse_batch_number(n)).collect();
        assert_eq!(numbers, vec![1, 2, 10, 99, 100]);
    }

    #[test]
    fn test_classify() {
        assert_eq!(SessionFile::classify("manifest.json"), SessionFile::Manifest);
        assert_eq!(SessionFile::classify("summary.json"), SessionFile::Staging);
        assert_eq!(SessionFile::classify("notes.json"), SessionFile::Notes);
        assert_eq!(
            SessionFile::classify("conversations_003.json"),
            SessionFile::Batch(3)
        );
        assert_eq!(
            SessionFile::classify("conversations_1200.json"),
            SessionFile::Batch(1200)
        );
        assert_eq!(
            SessionFile::classify("conversations_x.json"),
            SessionFile::Other("conversations_x.json".into())
        );
        assert_eq!(
            SessionFile::classify("Manifest.json"),
            SessionFile::Other("Manifest.json".into())
        );
    }

    #[test]
    fn test_content_vs_artifacts() {
        assert!(SessionFile::Batch(1).is_content());
        assert!(SessionFile::Notes.is_content());
        assert!(!SessionFile::Staging.is_content());
        assert!(!SessionFile::classify(".notes.json.a1B2c3.tmp").is_content());
        assert!(SessionFile::classify("extra.txt").is_content());
    }
}
