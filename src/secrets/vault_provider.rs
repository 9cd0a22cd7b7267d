//! Vault KV secret store client.
//!
//! Builds version-specific request URLs, issues a bounded GET and decodes
//! both KV engine response shapes into a single [`SecretContainer`].
//!
//! - v1: `GET {base}/v1/{path}`, secret map in `data`
//! - v2: `GET {base}/v1/{mount}/data/{subpath}`, secret map in `data.data`

use super::error::{body_snippet, MergeError, Result};
use super::types::SecretContainer;
use crate::config::{KvVersion, MergeConfig, VAULT_TOKEN_HEADER};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A source of secret containers addressed by slash-joined path.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Display name for logging.
    fn name(&self) -> &str;

    /// Fetch the container stored at `path`.
    async fn read(&self, path: &str) -> Result<SecretContainer>;
}

// ============================================================================
// URL construction
// ============================================================================

/// Build the request URL for `path` under the given KV version.
pub fn secret_url(base_url: &str, version: KvVersion, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match version {
        KvVersion::V1 => format!("{base}/v1/{path}"),
        KvVersion::V2 => {
            let mut segments = path.split('/').filter(|s| !s.is_empty());
            let mount = segments.next().unwrap_or_default();
            let mut url = format!("{base}/v1/{mount}/data");
            for segment in segments {
                url.push('/');
                url.push_str(segment);
            }
            url
        }
    }
}

// ============================================================================
// Response decoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct KvV1Body {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    lease_id: String,
    #[serde(default)]
    lease_duration: u64,
    data: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct KvV2Data {
    data: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct KvV2Body {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    lease_id: String,
    #[serde(default)]
    lease_duration: u64,
    data: KvV2Data,
}

/// A response body decoded according to the declared KV version.
#[derive(Debug)]
enum KvResponse {
    V1(KvV1Body),
    V2(KvV2Body),
}

impl KvResponse {
    fn decode(version: KvVersion, body: &str) -> std::result::Result<Self, serde_json::Error> {
        match version {
            KvVersion::V1 => serde_json::from_str(body).map(KvResponse::V1),
            KvVersion::V2 => serde_json::from_str(body).map(KvResponse::V2),
        }
    }
}

impl From<KvResponse> for SecretContainer {
    fn from(response: KvResponse) -> Self {
        let (request_id, lease_id, lease_duration, data) = match response {
            KvResponse::V1(body) => (
                body.request_id,
                body.lease_id,
                body.lease_duration,
                body.data,
            ),
            KvResponse::V2(body) => (
                body.request_id,
                body.lease_id,
                body.lease_duration,
                body.data.data,
            ),
        };

        SecretContainer {
            request_id,
            lease_id,
            lease_duration_seconds: lease_duration,
            data: data
                .into_iter()
                .filter_map(|(key, value)| secret_value_to_string(value).map(|v| (key, v)))
                .collect(),
        }
    }
}

/// Render a JSON secret value as the text written into the file.
///
/// `null` counts as absent. Nested values are written as compact JSON.
fn secret_value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        nested => Some(nested.to_string()),
    }
}

/// Decode a store response body for `path` into a normalized container.
pub fn decode_secret_response(
    version: KvVersion,
    path: &str,
    body: &str,
) -> Result<SecretContainer> {
    KvResponse::decode(version, body)
        .map(SecretContainer::from)
        .map_err(|e| {
            MergeError::store_response(path, body, format!("not a KV {version} body: {e}"))
        })
}

// ============================================================================
// HTTP client
// ============================================================================

/// Resolves secret containers from a Vault KV engine over HTTP.
pub struct VaultKvClient {
    client: reqwest::Client,
    base_url: String,
    version: KvVersion,
}

impl VaultKvClient {
    pub fn new(
        base_url: impl Into<String>,
        token: &str,
        version: KvVersion,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut token_value = HeaderValue::from_str(token).map_err(|_| {
            MergeError::Configuration("store token contains invalid header characters".into())
        })?;
        token_value.set_sensitive(true);
        headers.insert(VAULT_TOKEN_HEADER, token_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MergeError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            version,
        })
    }

    pub fn from_config(config: &MergeConfig) -> Result<Self> {
        Self::new(
            &config.store_url,
            &config.store_token,
            config.kv_version,
            config.request_timeout,
        )
    }
}

#[async_trait]
impl SecretStore for VaultKvClient {
    fn name(&self) -> &str {
        "vault"
    }

    async fn read(&self, path: &str) -> Result<SecretContainer> {
        let url = secret_url(&self.base_url, self.version, path);
        debug!("Reading KV {} secret at {url}", self.version);

        let request_error = |message: String| MergeError::StoreRequest {
            path: path.to_string(),
            message,
        };

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                request_error(format!("request to {url} timed out"))
            } else {
                request_error(format!("request to {url} failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(request_error(format!(
                "HTTP {status}: {}",
                body_snippet(&body)
            )));
        }

        decode_secret_response(self.version, path, &body)
    }
}
