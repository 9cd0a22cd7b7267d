//! Environment file rewriter.
//!
//! Substitutes every reference's original token with its resolved value and
//! writes the result back over the original file. The new content goes to a
//! temporary file next to the real target first and is renamed into place,
//! so a failed write never truncates the original. Symlinks are followed and
//! the link itself is left in place.

use super::error::{MergeError, Result};
use super::types::{Reference, ReferenceGroups};
use crate::config::SubstitutionMode;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Writes resolved references back into an environment file.
pub trait EnvRewriter: Send + Sync {
    /// Returns whether the file was actually written.
    fn rewrite(&self, path: &Path, groups: &ReferenceGroups) -> Result<bool>;
}

/// Rewriter performing literal substring substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRewriter {
    mode: SubstitutionMode,
}

impl FileRewriter {
    pub fn new(mode: SubstitutionMode) -> Self {
        Self { mode }
    }
}

impl EnvRewriter for FileRewriter {
    fn rewrite(&self, path: &Path, groups: &ReferenceGroups) -> Result<bool> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MergeError::file_io(path, e))?;

        let updated = match self.mode {
            SubstitutionMode::Global => substitute_global(&content, groups),
            SubstitutionMode::Line => substitute_line_scoped(&content, groups),
        };

        if updated == content {
            debug!("No changes for '{}', skipping write", path.display());
            return Ok(false);
        }

        write_atomically(path, updated.as_bytes())?;
        info!("Rewrote '{}' ({:?} substitution)", path.display(), self.mode);
        Ok(true)
    }
}

/// Replace every occurrence of every token across the whole buffer.
///
/// Tokens shared by several references all end up with the value of the
/// first reference processed (groups in path order, then file order).
pub fn substitute_global(content: &str, groups: &ReferenceGroups) -> String {
    let mut result = content.to_string();
    for reference in groups.values().flatten() {
        if reference.original_token.is_empty() {
            continue;
        }
        result = result.replace(&reference.original_token, reference.substitution());
    }
    result
}

/// Replace each token only on the line its reference was parsed from.
pub fn substitute_line_scoped(content: &str, groups: &ReferenceGroups) -> String {
    let mut by_line: BTreeMap<usize, Vec<&Reference>> = BTreeMap::new();
    for reference in groups.values().flatten() {
        by_line.entry(reference.line).or_default().push(reference);
    }

    let mut result = String::with_capacity(content.len());
    for (idx, line) in content.split_inclusive('\n').enumerate() {
        match by_line.get(&(idx + 1)) {
            Some(references) => {
                let mut line = line.to_string();
                for reference in references {
                    replace_last(&mut line, &reference.original_token, reference.substitution());
                }
                result.push_str(&line);
            }
            None => result.push_str(line),
        }
    }
    result
}

/// Tokens are the tail of their line, so the last occurrence is the one
/// produced by the parser.
fn replace_last(line: &mut String, token: &str, value: &str) {
    if token.is_empty() {
        return;
    }
    if let Some(pos) = line.rfind(token) {
        line.replace_range(pos..pos + token.len(), value);
    }
}

/// Write `bytes` to `path` through a temp file beside the resolved target,
/// then rename it over the target.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let target = std::fs::canonicalize(path).map_err(|e| MergeError::file_io(path, e))?;
    let dir = target.parent().unwrap_or_else(|| Path::new("/"));

    let permissions = std::fs::metadata(&target)
        .map_err(|e| MergeError::file_io(&target, e))?
        .permissions();

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| MergeError::file_io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| MergeError::file_io(tmp.path(), e))?;
    std::fs::set_permissions(tmp.path(), permissions)
        .map_err(|e| MergeError::file_io(tmp.path(), e))?;

    tmp.persist(&target)
        .map_err(|e| MergeError::file_io(&target, e.error))?;
    Ok(())
}
