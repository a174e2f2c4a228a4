//! Validation report types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One validation layer. Each passes or fails on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Syntax,
    Schema,
    Semantic,
    CrossFile,
    Presence,
}

impl Layer {
    /// Whether a failure in this layer makes the record invalid.
    ///
    /// Semantic and cross-file findings are count drift: informative, never
    /// corrupting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Syntax | Self::Schema | Self::Presence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding, located as precisely as the layer allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub layer: Layer,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Dotted path inside the file, e.g. `records[2].user`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(layer: Layer, message: impl Into<String>) -> Self {
        Self {
            layer,
            severity: Severity::Error,
            file: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn warning(layer: Layer, message: impl Into<String>) -> Self {
        Self {
            layer,
            severity: Severity::Warning,
            file: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, &self.field) {
            (Some(file), Some(field)) => write!(f, "{file}: {field}: {}", self.message),
            (Some(file), None) => write!(f, "{file}: {}", self.message),
            (None, Some(field)) => write!(f, "{field}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Pass/fail per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerResults {
    pub syntax: bool,
    pub schema: bool,
    pub semantic: bool,
    pub cross_file: bool,
    pub presence: bool,
}

impl Default for LayerResults {
    fn default() -> Self {
        Self {
            syntax: true,
            schema: true,
            semantic: true,
            cross_file: true,
            presence: true,
        }
    }
}

impl LayerResults {
    pub fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Syntax => self.syntax,
            Layer::Schema => self.schema,
            Layer::Semantic => self.semantic,
            Layer::CrossFile => self.cross_file,
            Layer::Presence => self.presence,
        }
    }

    pub fn fail(&mut self, layer: Layer) {
        match layer {
            Layer::Syntax => self.syntax = false,
            Layer::Schema => self.schema = false,
            Layer::Semantic => self.semantic = false,
            Layer::CrossFile => self.cross_file = false,
            Layer::Presence => self.presence = false,
        }
    }
}

/// What kind of file a [`FileValidation`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Manifest,
    Batch,
    Notes,
    Other,
}

/// Per-file detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidation {
    pub file: String,
    pub role: FileRole,
    /// No errors attributed to this file
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_count: Option<usize>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl FileValidation {
    pub fn new(file: impl Into<String>, role: FileRole) -> Self {
        Self {
            file: file.into(),
            role,
            valid: true,
            declared_count: None,
            actual_count: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Result of validating one experience record.
///
/// `valid` is false if and only if a fatal layer (syntax, schema, presence)
/// failed. Warnings never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub layers: LayerResults,
    pub files: Vec<FileValidation>,
    pub missing_files: Vec<String>,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            layers: LayerResults::default(),
            files: Vec::new(),
            missing_files: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    /// Records a finding and files it under errors or warnings.
    ///
    /// Errors fail their layer. Warnings fail only the warning-level layers
    /// (semantic, cross-file); a warning raised by a fatal layer, such as a
    /// stray file noticed by presence, leaves that layer passing.
    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.is_error() || !issue.layer.is_fatal() {
            self.layers.fail(issue.layer);
        }

        if let Some(file) = issue.file.clone() {
            let detail = self.file_mut(&file);
            let text = match &issue.field {
                Some(field) => format!("{field}: {}", issue.message),
                None => issue.message.clone(),
            };
            if issue.is_error() {
                detail.valid = false;
                detail.errors.push(text);
            } else {
                detail.warnings.push(text);
            }
        }

        if issue.is_error() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
        self.refresh_validity();
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Registers a file so it shows up in the per-file detail even when clean.
    pub fn track_file(&mut self, file: &str, role: FileRole) -> &mut FileValidation {
        if let Some(index) = self.files.iter().position(|f| f.file == file) {
            let detail = &mut self.files[index];
            detail.role = role;
            return detail;
        }
        self.files.push(FileValidation::new(file, role));
        self.files.sort_by(|a, b| a.file.cmp(&b.file));
        let index = self
            .files
            .iter()
            .position(|f| f.file == file)
            .unwrap_or(self.files.len() - 1);
        &mut self.files[index]
    }

    pub fn file(&self, file: &str) -> Option<&FileValidation> {
        self.files.iter().find(|f| f.file == file)
    }

    pub fn warnings_for(&self, file: &str) -> Vec<&ValidationIssue> {
        self.warnings
            .iter()
            .filter(|w| w.file.as_deref() == Some(file))
            .collect()
    }

    fn file_mut(&mut self, file: &str) -> &mut FileValidation {
        let role = self
            .files
            .iter()
            .find(|f| f.file == file)
            .map_or(FileRole::Other, |f| f.role);
        self.track_file(file, role)
    }

    fn refresh_validity(&mut self) {
        self.valid = self.layers.syntax && self.layers.schema && self.layers.presence;
    }
}
