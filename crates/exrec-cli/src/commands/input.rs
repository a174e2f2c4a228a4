use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;

/// Marker for "read from stdin" in place of a file path.
pub const STDIN: &str = "-";

/// Reads and parses JSON from a file path, or from stdin for `-`.
pub fn read_json<T: DeserializeOwned>(source: &str) -> Result<T> {
    let content = if source == STDIN {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read JSON from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?
    };

    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", describe(source)))
}

fn describe(source: &str) -> &str {
    if source == STDIN { "stdin" } else { source }
}
