//! Secret reference merging for environment files.
//!
//! Pipeline for replacing `$vault.path.key` placeholders with live values:
//! 1. **Parse**: extract references from the file, grouped by store path
//! 2. **Resolve**: fetch each path once from the KV store and attach values
//! 3. **Rewrite**: substitute tokens and write the file back in place

pub mod error;
pub mod parser;
pub mod resolver;
pub mod rewriter;
pub mod runner;
pub mod types;
pub mod vault_provider;

pub use error::MergeError;
pub use parser::{LineParser, ReferenceParser};
pub use resolver::resolve_references;
pub use rewriter::{EnvRewriter, FileRewriter};
pub use runner::MergeRunner;
pub use types::{MergeReport, Reference, ReferenceGroups, SecretContainer};
pub use vault_provider::{SecretStore, VaultKvClient};
