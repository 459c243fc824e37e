//! Secret store client.
//!
//! The pipeline only needs one operation from the store: fetch the
//! current bytes of a secret by locator. [`SecretManagerClient`] is
//! the Google Secret Manager REST implementation; tests substitute a
//! scripted fake. Authentication, retries, and caching belong to the
//! store side of the fence, not to dredge.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{AccessError, Result};

/// Read access to the external secret store.
#[async_trait]
pub trait SecretStore {
    /// Fetch the current raw bytes of the secret at `locator`.
    async fn access(&self, locator: &str) -> Result<Vec<u8>>;
}

/// Google Secret Manager REST client.
///
/// Issues `GET https://secretmanager.<universe>/v1/<locator>:access`
/// with a bearer token. A single failed request fails the run; any
/// retrying happens inside the HTTP stack, not here.
pub struct SecretManagerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// Response body of the `:access` endpoint.
#[derive(Deserialize)]
struct AccessResponse {
    payload: AccessPayload,
}

#[derive(Deserialize)]
struct AccessPayload {
    data: String,
}

impl SecretManagerClient {
    pub fn new(http: reqwest::Client, universe: &str, token: String) -> Self {
        Self {
            http,
            base_url: format!("https://secretmanager.{}", universe),
            token,
        }
    }
}

#[async_trait]
impl SecretStore for SecretManagerClient {
    async fn access(&self, locator: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/{}:access", self.base_url, locator);
        trace!(%locator, "requesting secret version");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AccessError::Transport {
                locator: locator.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AccessError::Store {
                locator: locator.to_string(),
                status: status.as_u16(),
                message: store_error_message(&body),
            }
            .into());
        }

        let body: AccessResponse =
            response.json().await.map_err(|e| AccessError::Transport {
                locator: locator.to_string(),
                source: e,
            })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&body.payload.data)
            .map_err(|e| AccessError::Payload {
                locator: locator.to_string(),
                reason: format!("invalid base64: {}", e),
            })?;

        debug!(%locator, len = bytes.len(), "fetched secret version");
        Ok(bytes)
    }
}

/// Pull the human-readable message out of a Google API error body,
/// falling back to the raw body.
fn store_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Resolve a bearer token for the store.
///
/// Prefers `GOOGLE_OAUTH_ACCESS_TOKEN`, then falls back to asking the
/// gcloud CLI for the active account's token.
pub fn resolve_access_token() -> Result<String> {
    if let Ok(token) = std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let gcloud = which::which("gcloud").map_err(|_| {
        AccessError::Auth("gcloud CLI not found on PATH".to_string())
    })?;

    let output = std::process::Command::new(gcloud)
        .args(["auth", "print-access-token"])
        .output()
        .map_err(|e| AccessError::Auth(format!("failed to run gcloud: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AccessError::Auth(format!(
            "gcloud auth print-access-token failed: {}",
            stderr.trim()
        ))
        .into());
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(AccessError::Auth("gcloud returned an empty token".to_string()).into());
    }

    Ok(token)
}
