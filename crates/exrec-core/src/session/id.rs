//! Session identifiers.
//!
//! A `SessionId` is the only user-supplied string that ever becomes part of a
//! filesystem path, so constructing one is the path traversal guard: every
//! operation takes a `SessionId`, never a raw `&str`.

use crate::error::{ExrecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A validated session identifier.
///
/// Guaranteed non-empty, not `.`, and free of `/`, `\`, `..` and NUL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Validates `raw` as a session identifier.
    ///
    /// # Errors
    ///
    /// Returns `ExrecError::InvalidIdentifier` if the string is empty, is `.`,
    /// or contains a path separator, a parent-directory sequence or a NUL byte.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(ExrecError::invalid_identifier(raw, "identifier is empty"));
        }
        if raw == "." {
            return Err(ExrecError::invalid_identifier(
                raw,
                "identifier names the current directory",
            ));
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(ExrecError::invalid_identifier(
                raw,
                "identifier contains a path separator",
            ));
        }
        if raw.contains("..") {
            return Err(ExrecError::invalid_identifier(
                raw,
                "identifier contains a parent-directory sequence",
            ));
        }
        if raw.contains('\0') {
            return Err(ExrecError::invalid_identifier(raw, "identifier contains NUL"));
        }

        Ok(Self(raw))
    }

    /// Generates a fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = ExrecError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = ExrecError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

// Deserializing goes through the same guard as `parse`.
impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}
