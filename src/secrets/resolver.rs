//! Reference resolver.
//!
//! Queries the store once per distinct path and attaches values to every
//! reference in that path's group. A missing key is a warning; a failed
//! store call aborts the whole run.

use super::error::Result;
use super::types::{MissingSecret, ReferenceGroups, ResolutionReport};
use super::vault_provider::SecretStore;
use tracing::{debug, info, warn};

/// Resolve every reference in `groups` in place.
pub async fn resolve_references(
    groups: &mut ReferenceGroups,
    store: &dyn SecretStore,
) -> Result<ResolutionReport> {
    let mut report = ResolutionReport::default();

    for (path, references) in groups.iter_mut() {
        debug!(
            "Resolving {} reference(s) at path '{}' via '{}'",
            references.len(),
            path,
            store.name()
        );

        let container = store.read(path).await?;
        report.paths_queried += 1;

        for reference in references.iter_mut() {
            match container.get(&reference.secret_key) {
                Some(value) => {
                    reference.resolved_value = Some(value.to_string());
                    report.resolved_count += 1;
                }
                None => {
                    warn!(
                        "Secret key '{}' was not found at path '{}' (line {})",
                        reference.secret_key, path, reference.line
                    );
                    report.missing.push(MissingSecret {
                        path: path.clone(),
                        key: reference.secret_key.clone(),
                        line: reference.line,
                    });
                }
            }
        }
    }

    info!(
        "Secret resolution complete: {} path(s) queried, {} resolved, {} missing",
        report.paths_queried,
        report.resolved_count,
        report.missing.len()
    );

    Ok(report)
}
