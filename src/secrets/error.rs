//! Error kinds for the merge pipeline.
//!
//! Every variant is fatal: the environment file is only rewritten when no
//! error was produced. Missing keys are not errors unless the run was
//! configured to fail on them (see [`MergeError::Unresolved`]).

use super::types::redact_secret;
use std::path::PathBuf;

/// Maximum number of response body characters kept for diagnostics.
pub const BODY_SNIPPET_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Malformed reference or assignment on a line.
    #[error("parse error on line {line}: {reason} (line: '{content}')")]
    Parse {
        line: usize,
        content: String,
        reason: String,
    },

    /// Invalid or unsupported run configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout or non-2xx status when calling the store.
    #[error("store request for path '{path}' failed: {message}")]
    StoreRequest { path: String, message: String },

    /// The store answered but the body did not match the declared KV version.
    #[error(
        "unexpected store response for path '{path}' ({size} bytes): {reason}; body: '{snippet}'"
    )]
    StoreResponse {
        path: String,
        size: usize,
        snippet: String,
        reason: String,
    },

    /// Failure reading or writing the environment file.
    #[error("file I/O error on '{}': {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Keys missing from the store while fail-on-missing is enabled.
    #[error("{} secret reference(s) unresolved: {}", .keys.len(), .keys.join(", "))]
    Unresolved { keys: Vec<String> },
}

impl MergeError {
    pub fn parse(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn store_response(path: &str, body: &str, reason: impl Into<String>) -> Self {
        Self::StoreResponse {
            path: path.to_string(),
            size: body.len(),
            snippet: body_snippet(&redact_body(body)),
            reason: reason.into(),
        }
    }

    /// Short label of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Configuration(_) => "configuration",
            Self::StoreRequest { .. } | Self::StoreResponse { .. } | Self::Unresolved { .. } => {
                "resolve"
            }
            Self::FileIo { .. } => "file",
        }
    }
}

/// First [`BODY_SNIPPET_CHARS`] characters of a response body.
pub fn body_snippet(body: &str) -> String {
    let mut snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
    if body.chars().count() > BODY_SNIPPET_CHARS {
        snippet.push('…');
    }
    snippet
}

/// A JSON body with every scalar leaf redacted, keeping its structure.
///
/// Bodies that are not JSON are returned unchanged.
pub fn redact_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(mut value) => {
            redact_leaves(&mut value);
            value.to_string()
        }
        Err(_) => body.to_string(),
    }
}

fn redact_leaves(value: &mut serde_json::Value) {
    use serde_json::Value;
    match value {
        Value::Object(map) => map.values_mut().for_each(redact_leaves),
        Value::Array(items) => items.iter_mut().for_each(redact_leaves),
        Value::Null => {}
        Value::String(s) => *s = redact_secret(s),
        scalar => *scalar = Value::String(redact_secret(&scalar.to_string())),
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
