//! Signing API client.
//!
//! The signing API exchanges `{storagePath, ttlSeconds}` for a time-limited
//! URL granting access to the stored object. It is idempotent and safe to
//! call repeatedly for the same path; the resolver layers caching and
//! deduplication on top.

use async_trait::async_trait;
use kiln_core::rpc::decode_signed_url_envelope;

/// Signing failures. Non-fatal to the app: the caller degrades the single
/// media item to a placeholder, never a blocking retry loop.
///
/// Variants carry strings so the error stays `Clone`; coalesced resolve
/// calls fan the same error out to every waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SigningError {
    #[error("signing request failed: {0}")]
    Network(String),

    #[error("signing denied: {0}")]
    Permission(String),

    #[error("signing backend error: {0}")]
    Backend(String),

    #[error("unusable signing response: {0}")]
    BadResponse(String),
}

/// A signed URL as returned by the signing API.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    /// Server-reported expiry, when the backend includes one. The resolver
    /// computes its own cache expiry from the requested TTL; this is kept
    /// for callers that want the authoritative value.
    pub expires_at_ms: Option<u64>,
}

/// External "sign this storage path" call.
#[async_trait]
pub trait SigningApi: Send + Sync {
    async fn sign(&self, storage_path: &str, ttl_secs: u64) -> Result<SignedUrl, SigningError>;
}

/// HTTP signing API client.
pub struct HttpSigningApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSigningApi {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl SigningApi for HttpSigningApi {
    async fn sign(&self, storage_path: &str, ttl_secs: u64) -> Result<SignedUrl, SigningError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "storagePath": storage_path,
                "ttlSeconds": ttl_secs,
            }))
            .send()
            .await
            .map_err(|e| SigningError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SigningError::Permission(format!(
                "signing rejected for {} ({})",
                storage_path, status
            )));
        }
        if !status.is_success() {
            return Err(SigningError::Backend(format!(
                "signing failed for {} ({})",
                storage_path, status
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SigningError::BadResponse(e.to_string()))?;

        let decoded =
            decode_signed_url_envelope(body).map_err(|e| SigningError::BadResponse(e.to_string()))?;

        Ok(SignedUrl {
            url: decoded.url,
            expires_at_ms: decoded.expires_at_ms,
        })
    }
}
