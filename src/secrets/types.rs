//! Core types for the secret merge pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// References
// ============================================================================

/// A secret mention found in the environment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Path segments of the secret container (`["secret", "database"]`).
    pub store_path: Vec<String>,
    /// Field name requested inside the container.
    pub secret_key: String,
    /// Exact substring of the file that gets replaced.
    pub original_token: String,
    /// 1-based line number where the reference was found.
    pub line: usize,
    /// Filled in by the resolver; `None` until then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<String>,
}

impl Reference {
    pub fn new(
        store_path: Vec<String>,
        secret_key: impl Into<String>,
        original_token: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            store_path,
            secret_key: secret_key.into(),
            original_token: original_token.into(),
            line,
            resolved_value: None,
        }
    }

    /// Slash-joined store path, as sent to the store API.
    pub fn joined_path(&self) -> String {
        self.store_path.join("/")
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_value.is_some()
    }

    /// Value written into the file. Unresolved references become empty.
    pub fn substitution(&self) -> &str {
        self.resolved_value.as_deref().unwrap_or("")
    }
}

/// References grouped by joined store path, so each path is queried once.
///
/// Ordered by path so that rewrites are deterministic when tokens collide.
pub type ReferenceGroups = BTreeMap<String, Vec<Reference>>;

/// Total number of references across all groups.
pub fn reference_count(groups: &ReferenceGroups) -> usize {
    groups.values().map(Vec::len).sum()
}

// ============================================================================
// Store response
// ============================================================================

/// Version-normalized secret container returned by a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretContainer {
    pub request_id: String,
    pub lease_id: String,
    pub lease_duration_seconds: u64,
    /// Secret key name to secret value.
    pub data: HashMap<String, String>,
}

impl SecretContainer {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

// ============================================================================
// Resolution report
// ============================================================================

/// A key that was absent from an otherwise successful store response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSecret {
    pub path: String,
    pub key: String,
    pub line: usize,
}

/// Outcome of resolving every reference group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// Number of distinct store paths queried.
    pub paths_queried: usize,
    pub resolved_count: usize,
    pub missing: Vec<MissingSecret>,
}

/// Summary of a full merge run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub reference_count: usize,
    pub paths_queried: usize,
    pub resolved_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingSecret>,
    /// Whether the environment file was rewritten.
    pub file_written: bool,
}

/// Redact a secret value for display (show first 2 and last 2 chars).
pub fn redact_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}
