//! Structural schema layer.
//!
//! Required-field checks over raw JSON. Working on `serde_json::Value` rather
//! than deserializing into the model lets one pass report every missing or
//! mistyped field instead of stopping at the first. Unknown fields are never
//! an error.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    String,
    /// String or null
    NullableString,
    StringArray,
    Array,
    Object,
    NonNegativeInteger,
    PositiveInteger,
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::NullableString => "a string or null",
            Self::StringArray => "an array of strings",
            Self::Array => "an array",
            Self::Object => "an object",
            Self::NonNegativeInteger => "a non-negative integer",
            Self::PositiveInteger => "a positive integer",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::NullableString => value.is_string() || value.is_null(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::NonNegativeInteger => value.is_u64(),
            Self::PositiveInteger => value.as_u64().is_some_and(|n| n >= 1),
        }
    }
}

struct FieldRule {
    name: &'static str,
    kind: FieldKind,
    required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: false,
    }
}

const MANIFEST_RULES: &[FieldRule] = &[
    required("version", FieldKind::String),
    required("session_id", FieldKind::String),
    required("name", FieldKind::String),
    required("context", FieldKind::String),
    optional("summary", FieldKind::String),
    required("flow", FieldKind::StringArray),
    required("topics", FieldKind::StringArray),
    optional("metadata", FieldKind::Object),
    required("created_at", FieldKind::String),
    optional("finalized_at", FieldKind::String),
    required("files", FieldKind::Object),
    required("total_conversations", FieldKind::NonNegativeInteger),
];

const MANIFEST_FILES_RULES: &[FieldRule] = &[
    required("conversations", FieldKind::StringArray),
    optional("notes", FieldKind::NullableString),
];

const BATCH_RULES: &[FieldRule] = &[
    required("batch_number", FieldKind::PositiveInteger),
    required("count", FieldKind::NonNegativeInteger),
    required("records", FieldKind::Array),
];

const RECORD_RULES: &[FieldRule] = &[
    required("user", FieldKind::String),
    required("response", FieldKind::String),
    required("rationale", FieldKind::String),
];

/// A field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path, empty for the document root
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_rules(value: &Value, rules: &[FieldRule], prefix: &str, errors: &mut Vec<FieldError>) {
    let Some(object) = value.as_object() else {
        errors.push(FieldError {
            field: prefix.to_string(),
            message: "expected an object".to_string(),
        });
        return;
    };

    for rule in rules {
        match object.get(rule.name) {
            None if rule.required => errors.push(FieldError {
                field: join(prefix, rule.name),
                message: "required field is missing".to_string(),
            }),
            None => {}
            Some(found) if !rule.kind.accepts(found) => errors.push(FieldError {
                field: join(prefix, rule.name),
                message: format!("expected {}", rule.kind.describe()),
            }),
            Some(_) => {}
        }
    }
}

/// Checks a manifest document.
pub fn check_manifest(value: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_rules(value, MANIFEST_RULES, "", &mut errors);

    if let Some(files) = value.get("files").filter(|f| f.is_object()) {
        check_rules(files, MANIFEST_FILES_RULES, "files", &mut errors);
    }

    errors
}

/// Checks a batch document, including every record inside it.
pub fn check_batch(value: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_rules(value, BATCH_RULES, "", &mut errors);

    if let Some(records) = value.get("records").and_then(Value::as_array) {
        for (index, record) in records.iter().enumerate() {
            check_rules(record, RECORD_RULES, &format!("records[{index}]"), &mut errors);
        }
    }

    errors
}
