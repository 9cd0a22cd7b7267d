use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_ASSIGNMENT_SEPARATOR, DEFAULT_KV_VERSION, DEFAULT_PATH_KEY_SEPARATOR,
    DEFAULT_REFERENCE_MARKER, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STORE_URL, VAULT_ADDR_ENV,
    VAULT_TOKEN_ENV,
};

#[derive(Parser)]
#[command(
    name = "secrets-manager",
    version,
    about = "Merge your environment file with your Vault secrets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace secret references in an environment file with store values
    Merge(MergeOpts),
    Version,
}

#[derive(clap::Args, Debug)]
pub struct MergeOpts {
    /// Environment file path
    #[arg(short = 'f', long)]
    pub file_path: PathBuf,

    /// Marker introducing a secret reference
    #[arg(short = 's', long, default_value = DEFAULT_REFERENCE_MARKER, allow_hyphen_values = true)]
    pub vault_separator: String,

    /// Separator between path segments and the key
    #[arg(short = 'p', long, default_value = DEFAULT_PATH_KEY_SEPARATOR, allow_hyphen_values = true)]
    pub path_key_value_separator: String,

    /// Separator between a variable and its value
    #[arg(short = 'q', long, default_value = DEFAULT_ASSIGNMENT_SEPARATOR, allow_hyphen_values = true)]
    pub file_key_value_separator: String,

    /// Vault address
    #[arg(short = 'v', long, env = VAULT_ADDR_ENV, default_value = DEFAULT_STORE_URL)]
    pub vault_host: String,

    /// Vault token
    #[arg(short = 't', long, env = VAULT_TOKEN_ENV, hide_env_values = true)]
    pub token: String,

    /// Key-value engine version (1 or 2)
    #[arg(short = 'k', long, default_value = DEFAULT_KV_VERSION)]
    pub kv_version: String,

    /// Per-request store timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Only replace tokens on the line where each reference was found
    #[arg(long)]
    pub line_scoped: bool,

    /// Abort when a referenced key is missing from the store
    #[arg(long)]
    pub fail_on_missing: bool,

    /// Resolve references without writing the file
    #[arg(long)]
    pub dry_run: bool,
}
