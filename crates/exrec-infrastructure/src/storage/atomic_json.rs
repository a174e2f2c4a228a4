//! Atomic JSON file operations.
//!
//! Every session file is written through a temporary sibling and renamed into
//! place, so a reader (or a restarted writer deriving status) never observes a
//! half-written batch or manifest. There is no locking: two writers to the
//! same file race and the last rename wins.

use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic JSON operations.
#[derive(Debug)]
pub enum AtomicJsonError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
}

impl std::fmt::Display for AtomicJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicJsonError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicJsonError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for AtomicJsonError {}

impl From<std::io::Error> for AtomicJsonError {
    fn from(e: std::io::Error) -> Self {
        AtomicJsonError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicJsonError {
    fn from(e: serde_json::Error) -> Self {
        AtomicJsonError::JsonError(e)
    }
}

/// Serializes `data` exactly as it is written to disk.
///
/// Pretty-printed with a trailing newline. Identical input always yields
/// identical bytes, which is what makes rewriting a batch idempotent.
pub fn to_pretty_bytes<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(data)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// A handle to a JSON file that is always replaced atomically.
///
/// Provides:
/// - **Atomicity**: writes go to a unique `.<name>.*.tmp` and are renamed into place
/// - **Durability**: explicit fsync before rename
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new atomic JSON file handle.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let data: T = serde_json::from_slice(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the file atomically and returns the number of bytes written.
    ///
    /// Each call writes through its own uniquely named `.<name>.<random>.tmp`
    /// sibling, so concurrent saves to the same path never share a temp file:
    /// every save succeeds and the last rename wins. The parent directory is
    /// created if missing.
    pub fn save(&self, data: &T) -> Result<u64, AtomicJsonError> {
        let (parent, file_name) = self.split_path()?;
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        let bytes = to_pretty_bytes(data)?;

        // Write to a temporary file in the same directory
        let mut tmp_file = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempfile_in(parent)?;
        tmp_file.write_all(&bytes)?;
        tmp_file.as_file().sync_all()?;

        // Atomic rename; the temp file is removed if this fails
        tmp_file.persist(&self.path).map_err(|e| e.error)?;

        Ok(bytes.len() as u64)
    }

    /// Removes the file. A file that is already gone is not an error.
    pub fn remove(&self) -> Result<bool, AtomicJsonError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Splits the target into its directory and file name.
    fn split_path(&self) -> Result<(&Path, String), AtomicJsonError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        Ok((parent, file_name.to_string_lossy().into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestBatch {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");
        let atomic_file = AtomicJsonFile::<TestBatch>::new(file_path);

        let batch = TestBatch {
            name: "test".to_string(),
            count: 42,
        };

        let written = atomic_file.save(&batch).unwrap();
        assert!(written > 0);

        let loaded = atomic_file.load().unwrap().unwrap();
        assert_eq!(loaded, batch);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let atomic_file = AtomicJsonFile::<TestBatch>::new(temp_dir.path().join("missing.json"));
        assert!(atomic_file.load().unwrap().is_none());
    }

    #[test]
    fn test_creates_parent_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("test.json");
        let atomic_file = AtomicJsonFile::<TestBatch>::new(file_path.clone());

        atomic_file
            .save(&TestBatch {
                name: "a".into(),
                count: 1,
            })
            .unwrap();

        assert!(file_path.exists());
        let names: Vec<String> = fs::read_dir(temp_dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["test.json".to_string()]);
    }

    #[test]
    fn test_identical_content_identical_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");
        let atomic_file = AtomicJsonFile::<TestBatch>::new(file_path.clone());
        let batch = TestBatch {
            name: "same".into(),
            count: 7,
        };

        atomic_file.save(&batch).unwrap();
        let first = fs::read(&file_path).unwrap();
        atomic_file.save(&batch).unwrap();
        let second = fs::read(&file_path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let atomic_file = AtomicJsonFile::<TestBatch>::new(temp_dir.path().join("x.json"));
        atomic_file
            .save(&TestBatch {
                name: "x".into(),
                count: 0,
            })
            .unwrap();
        assert!(atomic_file.remove().unwrap());
        assert!(!atomic_file.remove().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bad.json");
        fs::write(&file_path, "{ not json").unwrap();
        let atomic_file = AtomicJsonFile::<TestBatch>::new(file_path);
        assert!(matches!(atomic_file.load(), Err(AtomicJsonError::JsonError(_))));
    }
}
