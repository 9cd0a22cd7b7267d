/// Default configuration constants for a merge run.

/// Default marker introducing a secret reference inside a line.
pub const DEFAULT_REFERENCE_MARKER: &str = "$vault.";

/// Default separator between path segments and the trailing key.
pub const DEFAULT_PATH_KEY_SEPARATOR: &str = ".";

/// Default separator between a variable name and its value.
pub const DEFAULT_ASSIGNMENT_SEPARATOR: &str = "= ";

/// Default secret store address.
pub const DEFAULT_STORE_URL: &str = "http://localhost:8200";

/// Default KV engine version tag.
pub const DEFAULT_KV_VERSION: &str = "2";

/// Default per-request store timeout (1 second).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

/// Header carrying the store token.
pub const VAULT_TOKEN_HEADER: &str = "x-vault-token";

/// Environment variable read for the store address.
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";

/// Environment variable read for the store token.
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";
