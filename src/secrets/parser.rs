//! Reference parser.
//!
//! Scans an environment file line by line and extracts secret references of
//! the form `NAME<assignment>...<marker>seg<sep>seg<sep>key`. Lines without
//! the marker are left alone.

use super::error::{MergeError, Result};
use super::types::{Reference, ReferenceGroups};
use crate::config::MergeConfig;
use tracing::debug;

/// Extracts grouped references from environment file content.
pub trait ReferenceParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<ReferenceGroups>;
}

/// Separator-driven line parser.
#[derive(Debug, Clone)]
pub struct LineParser {
    marker: String,
    path_key_separator: String,
    assignment_separator: String,
}

impl LineParser {
    pub fn new(
        marker: impl Into<String>,
        path_key_separator: impl Into<String>,
        assignment_separator: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.into(),
            path_key_separator: path_key_separator.into(),
            assignment_separator: assignment_separator.into(),
        }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(
            &config.reference_marker,
            &config.path_key_separator,
            &config.assignment_separator,
        )
    }

    /// Parse a single line. `Ok(None)` when the line carries no reference.
    pub fn parse_line(&self, raw: &str, line_no: usize) -> Result<Option<Reference>> {
        let line = raw.trim();

        let Some((_, after_marker)) = line.split_once(self.marker.as_str()) else {
            return Ok(None);
        };

        let mut segments: Vec<String> = after_marker
            .split(self.path_key_separator.as_str())
            .map(str::to_string)
            .collect();
        if segments.len() < 2 {
            return Err(MergeError::parse(
                line_no,
                line,
                format!(
                    "reference needs a path and a key separated by '{}'",
                    self.path_key_separator
                ),
            ));
        }

        let secret_key = segments.pop().unwrap_or_default();
        if secret_key.is_empty() {
            return Err(MergeError::parse(line_no, line, "reference has an empty key"));
        }
        if segments.iter().all(String::is_empty) {
            return Err(MergeError::parse(line_no, line, "reference has an empty path"));
        }

        let Some((_, token)) = line.split_once(self.assignment_separator.as_str()) else {
            return Err(MergeError::parse(
                line_no,
                line,
                format!(
                    "missing assignment separator '{}'",
                    self.assignment_separator
                ),
            ));
        };
        if token.is_empty() {
            return Err(MergeError::parse(line_no, line, "nothing to replace after the assignment"));
        }

        Ok(Some(Reference::new(segments, secret_key, token, line_no)))
    }
}

impl ReferenceParser for LineParser {
    fn parse(&self, content: &str) -> Result<ReferenceGroups> {
        let mut groups = ReferenceGroups::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(reference) = self.parse_line(line, idx + 1)? {
                debug!(
                    "Line {}: reference to key '{}' at path '{}'",
                    reference.line,
                    reference.secret_key,
                    reference.joined_path()
                );
                groups
                    .entry(reference.joined_path())
                    .or_default()
                    .push(reference);
            }
        }

        Ok(groups)
    }
}
