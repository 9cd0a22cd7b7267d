mod defaults;
mod types;
mod validation;

pub use defaults::*;
pub use types::*;
pub use validation::*;

use crate::cli::MergeOpts;
use crate::secrets::error::MergeError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Configuration of a single merge run. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConfig {
    /// Environment file, read and overwritten in place.
    pub file_path: PathBuf,
    pub reference_marker: String,
    pub path_key_separator: String,
    pub assignment_separator: String,
    pub store_url: String,
    #[serde(skip)]
    pub store_token: String,
    pub kv_version: KvVersion,
    pub request_timeout: Duration,
    pub substitution: SubstitutionMode,
    /// Abort instead of writing empty values for missing keys.
    pub fail_on_missing: bool,
    /// Resolve but never write the file.
    pub dry_run: bool,
}

impl MergeConfig {
    /// Configuration with default separators, host and timeout.
    pub fn new(
        file_path: impl Into<PathBuf>,
        store_token: impl Into<String>,
        kv_version: KvVersion,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            reference_marker: DEFAULT_REFERENCE_MARKER.to_string(),
            path_key_separator: DEFAULT_PATH_KEY_SEPARATOR.to_string(),
            assignment_separator: DEFAULT_ASSIGNMENT_SEPARATOR.to_string(),
            store_url: DEFAULT_STORE_URL.to_string(),
            store_token: store_token.into(),
            kv_version,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            substitution: SubstitutionMode::default(),
            fail_on_missing: false,
            dry_run: false,
        }
    }

    /// Build and validate a configuration from `merge` command options.
    pub fn from_opts(opts: &MergeOpts) -> Result<Self, MergeError> {
        let kv_version: KvVersion = opts.kv_version.parse()?;

        let config = Self {
            file_path: opts.file_path.clone(),
            reference_marker: opts.vault_separator.clone(),
            path_key_separator: opts.path_key_value_separator.clone(),
            assignment_separator: opts.file_key_value_separator.clone(),
            store_url: opts.vault_host.clone(),
            store_token: opts.token.clone(),
            kv_version,
            request_timeout: Duration::from_millis(opts.timeout_ms),
            substitution: if opts.line_scoped {
                SubstitutionMode::Line
            } else {
                SubstitutionMode::Global
            },
            fail_on_missing: opts.fail_on_missing,
            dry_run: opts.dry_run,
        };

        validate_config_object(&config)?;
        debug!(
            "Merge config: file={}, store={}, kv={}",
            config.file_path.display(),
            config.store_url,
            config.kv_version
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn merge_opts(args: &[&str]) -> MergeOpts {
        let mut argv = vec!["secrets-manager", "merge"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Merge(opts) => opts,
            _ => panic!("expected merge command"),
        }
    }

    #[test]
    fn from_opts_applies_defaults() {
        let opts = merge_opts(&["-f", ".env.development", "-t", "hvs.abc"]);
        let config = MergeConfig::from_opts(&opts).unwrap();

        assert_eq!(config.file_path, PathBuf::from(".env.development"));
        assert_eq!(config.reference_marker, "$vault.");
        assert_eq!(config.path_key_separator, ".");
        assert_eq!(config.assignment_separator, "= ");
        assert_eq!(config.kv_version, KvVersion::V2);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.substitution, SubstitutionMode::Global);
        assert!(!config.fail_on_missing);
        assert!(!config.dry_run);
    }

    #[test]
    fn from_opts_rejects_unknown_kv_version() {
        let opts = merge_opts(&["-f", ".env", "-t", "tok", "-k", "7"]);
        let err = MergeConfig::from_opts(&opts).unwrap_err();
        assert!(matches!(err, MergeError::Configuration(_)));
    }

    #[test]
    fn from_opts_maps_flags() {
        let opts = merge_opts(&[
            "-f",
            "app.env",
            "-t",
            "tok",
            "-k",
            "1",
            "-s",
            "@@",
            "-p",
            "/",
            "-q",
            "=",
            "-v",
            "https://vault.internal:8200",
            "--timeout-ms",
            "250",
            "--line-scoped",
            "--fail-on-missing",
            "--dry-run",
        ]);
        let config = MergeConfig::from_opts(&opts).unwrap();

        assert_eq!(config.kv_version, KvVersion::V1);
        assert_eq!(config.reference_marker, "@@");
        assert_eq!(config.path_key_separator, "/");
        assert_eq!(config.assignment_separator, "=");
        assert_eq!(config.store_url, "https://vault.internal:8200");
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.substitution, SubstitutionMode::Line);
        assert!(config.fail_on_missing);
        assert!(config.dry_run);
    }

    #[test]
    fn token_is_not_serialized() {
        let config = MergeConfig::new(".env", "hvs.super-secret", KvVersion::V1);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hvs.super-secret"));
    }
}
