//! Thumbnail storage.
//!
//! Captured frames are small enough for a single PUT; no resumable session
//! involved.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::thumbnail::ThumbnailError;

/// Destination for captured thumbnail frames.
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Store `data` under `object_path`, returning the public URL.
    async fn store(
        &self,
        object_path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, ThumbnailError>;
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    url: String,
}

/// HTTP upsert implementation.
pub struct HttpThumbnailStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
}

impl HttpThumbnailStore {
    pub fn new(client: reqwest::Client, endpoint: String, bucket: String) -> Self {
        Self {
            client,
            endpoint,
            bucket,
        }
    }
}

#[async_trait]
impl ThumbnailStore for HttpThumbnailStore {
    async fn store(
        &self,
        object_path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, ThumbnailError> {
        let response = self
            .client
            .put(format!(
                "{}/objects/{}/{}",
                self.endpoint, self.bucket, object_path
            ))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| ThumbnailError::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ThumbnailError::Store(format!("{status}: {body}")));
        }

        let body: StoreResponse = response
            .json()
            .await
            .map_err(|e| ThumbnailError::Store(e.to_string()))?;

        tracing::debug!(object_path = %object_path, url = %body.url, "Stored thumbnail");
        Ok(body.url)
    }
}
