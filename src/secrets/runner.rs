//! Merge pipeline: parse → resolve → rewrite.
//!
//! Collaborators are injected as trait objects so tests can replace any
//! stage. The file is read once up front and the handle released before
//! any network call; it is only rewritten after every stage succeeded.

use super::error::{MergeError, Result};
use super::parser::{LineParser, ReferenceParser};
use super::resolver::resolve_references;
use super::rewriter::{EnvRewriter, FileRewriter};
use super::types::{redact_secret, reference_count, MergeReport};
use super::vault_provider::{SecretStore, VaultKvClient};
use crate::config::MergeConfig;
use tracing::{info, warn};

pub struct MergeRunner {
    config: MergeConfig,
    parser: Box<dyn ReferenceParser>,
    store: Box<dyn SecretStore>,
    rewriter: Box<dyn EnvRewriter>,
}

impl MergeRunner {
    /// Runner wired to the line parser, Vault KV client and file rewriter.
    pub fn from_config(config: MergeConfig) -> Result<Self> {
        let parser = LineParser::from_config(&config);
        let store = VaultKvClient::from_config(&config)?;
        let rewriter = FileRewriter::new(config.substitution);
        Ok(Self::new(
            config,
            Box::new(parser),
            Box::new(store),
            Box::new(rewriter),
        ))
    }

    pub fn new(
        config: MergeConfig,
        parser: Box<dyn ReferenceParser>,
        store: Box<dyn SecretStore>,
        rewriter: Box<dyn EnvRewriter>,
    ) -> Self {
        Self {
            config,
            parser,
            store,
            rewriter,
        }
    }

    pub async fn run(&self) -> Result<MergeReport> {
        let path = &self.config.file_path;

        let content =
            std::fs::read_to_string(path).map_err(|e| MergeError::file_io(path, e))?;
        let mut groups = self.parser.parse(&content)?;
        drop(content);

        let references = reference_count(&groups);
        info!(
            "Found {} secret reference(s) across {} path(s) in '{}'",
            references,
            groups.len(),
            path.display()
        );

        if groups.is_empty() {
            info!("No secret references found, nothing to merge");
            return Ok(MergeReport::default());
        }

        let resolution = resolve_references(&mut groups, self.store.as_ref()).await?;

        if self.config.fail_on_missing && !resolution.missing.is_empty() {
            let keys = resolution
                .missing
                .iter()
                .map(|m| format!("{}#{}", m.path, m.key))
                .collect();
            return Err(MergeError::Unresolved { keys });
        }

        let mut report = MergeReport {
            reference_count: references,
            paths_queried: resolution.paths_queried,
            resolved_count: resolution.resolved_count,
            missing: resolution.missing,
            file_written: false,
        };

        if self.config.dry_run {
            for reference in groups.values().flatten() {
                match &reference.resolved_value {
                    Some(value) => info!(
                        "[dry-run] line {}: {} -> {}",
                        reference.line,
                        reference.original_token,
                        redact_secret(value)
                    ),
                    None => warn!(
                        "[dry-run] line {}: {} -> (empty, key '{}' missing)",
                        reference.line, reference.original_token, reference.secret_key
                    ),
                }
            }
            info!("Dry run: '{}' left unchanged", path.display());
            return Ok(report);
        }

        report.file_written = self.rewriter.rewrite(path, &groups)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KvVersion;
    use crate::secrets::types::{ReferenceGroups, SecretContainer};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct StaticStore(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl SecretStore for StaticStore {
        fn name(&self) -> &str {
            "static"
        }

        async fn read(&self, _path: &str) -> Result<SecretContainer> {
            Ok(SecretContainer {
                data: self
                    .0
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            })
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SecretStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn read(&self, path: &str) -> Result<SecretContainer> {
            Err(MergeError::StoreRequest {
                path: path.to_string(),
                message: "connection refused".into(),
            })
        }
    }

    /// Records calls instead of touching the filesystem.
    #[derive(Clone, Default)]
    struct RecordingRewriter(Arc<Mutex<Vec<(PathBuf, ReferenceGroups)>>>);

    impl EnvRewriter for RecordingRewriter {
        fn rewrite(&self, path: &Path, groups: &ReferenceGroups) -> Result<bool> {
            self.0
                .lock()
                .unwrap()
                .push((path.to_path_buf(), groups.clone()));
            Ok(true)
        }
    }

    fn env_file(content: &str) -> (TempDir, MergeConfig) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, content).unwrap();
        (dir, MergeConfig::new(path, "token", KvVersion::V2))
    }

    fn runner(
        config: MergeConfig,
        store: impl SecretStore + 'static,
        rewriter: RecordingRewriter,
    ) -> MergeRunner {
        let parser = LineParser::from_config(&config);
        MergeRunner::new(config, Box::new(parser), Box::new(store), Box::new(rewriter))
    }

    #[tokio::test]
    async fn resolves_and_hands_groups_to_rewriter() {
        let (_dir, config) = env_file("DB_HOST = $vault.secret.db.host\nFOO = bar\n");
        let rewriter = RecordingRewriter::default();
        let report = runner(config, StaticStore(vec![("host", "10.0.0.1")]), rewriter.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.reference_count, 1);
        assert_eq!(report.resolved_count, 1);
        assert!(report.file_written);

        let calls = rewriter.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let reference = &calls[0].1["secret/db"][0];
        assert_eq!(reference.resolved_value.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn no_references_skips_store_and_rewrite() {
        let (_dir, config) = env_file("FOO = bar\n");
        let rewriter = RecordingRewriter::default();
        let report = runner(config, FailingStore, rewriter.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.reference_count, 0);
        assert!(!report.file_written);
        assert!(rewriter.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn parse_error_happens_before_store() {
        let (_dir, config) = env_file("DB = $vault.broken\n");
        let rewriter = RecordingRewriter::default();
        let err = runner(config, FailingStore, rewriter.clone())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::Parse { line: 1, .. }));
        assert!(rewriter.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_skips_rewrite() {
        let (_dir, config) = env_file("DB_HOST = $vault.secret.db.host\n");
        let rewriter = RecordingRewriter::default();
        let err = runner(config, FailingStore, rewriter.clone())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::StoreRequest { .. }));
        assert!(rewriter.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fail_on_missing_aborts_before_rewrite() {
        let (_dir, mut config) = env_file("DB_PASS = $vault.secret.db.password\n");
        config.fail_on_missing = true;
        let rewriter = RecordingRewriter::default();
        let err = runner(config, StaticStore(vec![]), rewriter.clone())
            .run()
            .await
            .unwrap_err();

        match err {
            MergeError::Unresolved { keys } => assert_eq!(keys, vec!["secret/db#password"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(rewriter.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_does_not_rewrite() {
        let (_dir, mut config) = env_file("DB_HOST = $vault.secret.db.host\n");
        config.dry_run = true;
        let rewriter = RecordingRewriter::default();
        let report = runner(config, StaticStore(vec![("host", "10.0.0.1")]), rewriter.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.resolved_count, 1);
        assert!(!report.file_written);
        assert!(rewriter.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_file_io_error() {
        let dir = TempDir::new().unwrap();
        let config = MergeConfig::new(dir.path().join("nope.env"), "token", KvVersion::V1);
        let err = runner(config, FailingStore, RecordingRewriter::default())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::FileIo { .. }));
    }

    #[tokio::test]
    async fn unchanged_content_is_not_reported_as_written() {
        let (_dir, config) = env_file("A = $vault.kv.a\n");
        let parser = LineParser::from_config(&config);
        let runner = MergeRunner::new(
            config,
            Box::new(parser),
            Box::new(StaticStore(vec![("a", "$vault.kv.a")])),
            Box::new(FileRewriter::default()),
        );

        let report = runner.run().await.unwrap();
        assert_eq!(report.resolved_count, 1);
        assert!(!report.file_written);
    }
}
