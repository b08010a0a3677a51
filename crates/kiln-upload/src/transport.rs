//! Resumable upload transport.
//!
//! The transport speaks to the storage upload endpoint: open a session with
//! object metadata, discover the committed offset of a previous attempt by
//! fingerprint, and send byte ranges. The session state machine in
//! [`crate::session`] drives it and owns retry/cancellation policy.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::auth::AuthToken;
use crate::error::UploadError;

/// Object metadata sent when opening an upload session.
#[derive(Clone, Debug)]
pub struct UploadMetadata {
    pub bucket: String,
    pub object_name: String,
    pub content_type: String,
    pub cache_control: String,
    pub total_bytes: u64,
    pub fingerprint: String,
}

/// An open upload session on the far end.
#[derive(Clone, Debug)]
pub struct UploadHandle {
    pub session_uri: String,
}

/// A previous incomplete session found by fingerprint.
#[derive(Clone, Debug)]
pub struct PriorSession {
    pub handle: UploadHandle,
    /// Last byte offset the far end has acknowledged. Resumption starts
    /// exactly here.
    pub committed_offset: u64,
    /// Object name the prior attempt was writing; the resumed attempt keeps
    /// writing it.
    pub object_name: String,
}

/// Acknowledgement of one chunk transfer.
#[derive(Clone, Debug)]
pub struct ChunkAck {
    /// Total bytes the far end has now committed.
    pub committed_offset: u64,
    /// Final storage path, present once the object is complete.
    pub stored_path: Option<String>,
}

/// Chunked, resumable upload endpoint.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn create_session(
        &self,
        metadata: &UploadMetadata,
        token: &AuthToken,
    ) -> Result<UploadHandle, UploadError>;

    /// Look up an incomplete session for this fingerprint, if the far end
    /// still has one.
    async fn find_previous(
        &self,
        fingerprint: &str,
        token: &AuthToken,
    ) -> Result<Option<PriorSession>, UploadError>;

    /// Send one byte range starting at `offset`.
    async fn put_chunk(
        &self,
        handle: &UploadHandle,
        token: &AuthToken,
        offset: u64,
        chunk: Bytes,
        total_bytes: u64,
    ) -> Result<ChunkAck, UploadError>;
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "sessionUri")]
    session_uri: String,
}

#[derive(Debug, Deserialize)]
struct ResumeResponse {
    #[serde(rename = "sessionUri")]
    session_uri: String,
    #[serde(rename = "committedOffset", default)]
    committed_offset: u64,
    #[serde(rename = "objectName")]
    object_name: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(rename = "storedPath")]
    stored_path: Option<String>,
}

/// HTTP implementation of the resumable upload protocol.
pub struct HttpUploadTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploadTransport {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    fn classify_status(status: reqwest::StatusCode, body: String) -> UploadError {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => UploadError::Unauthenticated(body),
            reqwest::StatusCode::PAYLOAD_TOO_LARGE | reqwest::StatusCode::INSUFFICIENT_STORAGE => {
                UploadError::QuotaExceeded(body)
            }
            status if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                UploadError::Transport(format!("{status}: {body}"))
            }
            status => UploadError::Rejected(format!("{status}: {body}")),
        }
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn create_session(
        &self,
        metadata: &UploadMetadata,
        token: &AuthToken,
    ) -> Result<UploadHandle, UploadError> {
        let response = self
            .client
            .post(format!("{}/sessions", self.endpoint))
            .bearer_auth(&token.bearer)
            .header("x-upload-fingerprint", &metadata.fingerprint)
            .json(&serde_json::json!({
                "bucket": metadata.bucket,
                "objectName": metadata.object_name,
                "contentType": metadata.content_type,
                "cacheControl": metadata.cache_control,
                "totalBytes": metadata.total_bytes,
            }))
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        // Prefer the Location header; fall back to the JSON body.
        if let Some(location) = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
        {
            return Ok(UploadHandle {
                session_uri: location.to_string(),
            });
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(UploadHandle {
            session_uri: body.session_uri,
        })
    }

    async fn find_previous(
        &self,
        fingerprint: &str,
        token: &AuthToken,
    ) -> Result<Option<PriorSession>, UploadError> {
        let response = self
            .client
            .get(format!("{}/sessions", self.endpoint))
            .bearer_auth(&token.bearer)
            .query(&[("fingerprint", fingerprint)])
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let body: ResumeResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Some(PriorSession {
            handle: UploadHandle {
                session_uri: body.session_uri,
            },
            committed_offset: body.committed_offset,
            object_name: body.object_name,
        }))
    }

    async fn put_chunk(
        &self,
        handle: &UploadHandle,
        token: &AuthToken,
        offset: u64,
        chunk: Bytes,
        total_bytes: u64,
    ) -> Result<ChunkAck, UploadError> {
        let last = offset + chunk.len() as u64 - 1;
        let response = self
            .client
            .put(&handle.session_uri)
            .bearer_auth(&token.bearer)
            .header(
                reqwest::header::CONTENT_RANGE,
                format!("bytes {offset}-{last}/{total_bytes}"),
            )
            .body(chunk)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();

        // 308 Permanent Redirect doubles as "resume incomplete" in the
        // resumable protocol: the committed offset comes back in a header.
        if status == reqwest::StatusCode::PERMANENT_REDIRECT {
            let committed_offset = response
                .headers()
                .get("upload-offset")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(last + 1);
            return Ok(ChunkAck {
                committed_offset,
                stored_path: None,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(ChunkAck {
            committed_offset: total_bytes,
            stored_path: body.stored_path,
        })
    }
}
