//! Discovery of completed sessions: manifest summaries and filtering.

use crate::session::Manifest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// The part of a manifest a reader needs to decide whether to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub session_id: String,
    pub directory: PathBuf,
    pub name: String,
    pub context: String,
    pub topics: Vec<String>,
    pub total_conversations: usize,
    pub created_at: String,
    pub finalized_at: String,
}

impl ManifestSummary {
    pub fn from_manifest(manifest: &Manifest, directory: PathBuf) -> Self {
        Self {
            session_id: manifest.session_id.clone(),
            directory,
            name: manifest.name.clone(),
            context: manifest.context.clone(),
            topics: manifest.topics.clone(),
            total_conversations: manifest.total_conversations,
            created_at: manifest.created_at.clone(),
            finalized_at: manifest.finalized_at.clone(),
        }
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Optional constraints over manifest fields. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestFilter {
    /// Case-insensitive substring of `name`
    pub name_contains: Option<String>,
    /// Case-insensitive substring of `context`
    pub context_contains: Option<String>,
    /// At least one of these topics must be present
    pub topics_any: Vec<String>,
    /// Inclusive
    pub min_conversations: Option<usize>,
    /// Inclusive
    pub max_conversations: Option<usize>,
    /// Inclusive
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive
    pub created_before: Option<DateTime<Utc>>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl ManifestFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether `summary` satisfies every constraint.
    ///
    /// A summary whose `created_at` cannot be parsed never satisfies a date
    /// constraint, but passes when no date constraint is set.
    pub fn matches(&self, summary: &ManifestSummary) -> bool {
        if let Some(needle) = &self.name_contains {
            if !contains_ci(&summary.name, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.context_contains {
            if !contains_ci(&summary.context, needle) {
                return false;
            }
        }
        if !self.topics_any.is_empty() {
            let wanted: HashSet<&str> = self.topics_any.iter().map(String::as_str).collect();
            if !summary.topics.iter().any(|t| wanted.contains(t.as_str())) {
                return false;
            }
        }
        if self
            .min_conversations
            .is_some_and(|min| summary.total_conversations < min)
        {
            return false;
        }
        if self
            .max_conversations
            .is_some_and(|max| summary.total_conversations > max)
        {
            return false;
        }
        if self.created_after.is_some() || self.created_before.is_some() {
            let Some(created) = summary.created_at_utc() else {
                return false;
            };
            if self.created_after.is_some_and(|after| created < after) {
                return false;
            }
            if self.created_before.is_some_and(|before| created > before) {
                return false;
            }
        }
        true
    }
}
