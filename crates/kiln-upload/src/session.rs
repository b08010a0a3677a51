//! Resumable upload session.
//!
//! Drives the `Idle → Preparing → Signing → Uploading → Completed|Failed`
//! state machine over an [`UploadTransport`]: size gate, content-type
//! sniffing, fingerprint-based resume, fixed-size chunks with a bounded
//! retry schedule, progress and phase callbacks, and explicit cancellation.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use kiln_core::config::MediaConfig;
use kiln_core::models::StoredObject;

use crate::auth::{AuthProvider, AuthToken};
use crate::content_type;
use crate::error::UploadError;
use crate::fingerprint::fingerprint;
use crate::source::UploadSource;
use crate::transport::{ChunkAck, UploadHandle, UploadMetadata, UploadTransport};

/// Leading bytes read for content-type sniffing.
const SNIFF_LEN: usize = 64;

/// Phases of one upload attempt, reported through the phase callback for
/// UI display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Preparing,
    Signing,
    Uploading,
    Completed,
    Failed,
}

impl UploadPhase {
    pub fn name(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Preparing => "preparing",
            UploadPhase::Signing => "signing",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Completed => "completed",
            UploadPhase::Failed => "failed",
        }
    }
}

pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;
pub type PhaseFn = Arc<dyn Fn(UploadPhase) + Send + Sync>;

/// Optional progress and phase callbacks for one upload.
#[derive(Clone, Default)]
pub struct UploadCallbacks {
    /// `(bytes_sent, bytes_total)` after each acknowledged chunk.
    pub on_progress: Option<ProgressFn>,
    /// Phase-name transitions for UI display.
    pub on_phase: Option<PhaseFn>,
}

impl UploadCallbacks {
    fn phase(&self, phase: UploadPhase) {
        if let Some(on_phase) = &self.on_phase {
            on_phase(phase);
        }
    }

    fn progress(&self, sent: u64, total: u64) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(sent, total);
        }
    }
}

/// Per-session configuration.
#[derive(Clone, Debug)]
pub struct UploadSessionConfig {
    pub bucket: String,
    /// Prefix under which uploaded objects are named.
    pub object_prefix: String,
    pub cache_control: String,
    pub chunk_size_bytes: usize,
    /// Delays between transient chunk failures; length bounds the attempt
    /// count.
    pub retry_delays_ms: Vec<u64>,
    pub max_file_bytes: u64,
}

impl Default for UploadSessionConfig {
    fn default() -> Self {
        Self::from_media(&MediaConfig::default())
    }
}

impl UploadSessionConfig {
    pub fn from_media(config: &MediaConfig) -> Self {
        Self {
            bucket: "media".to_string(),
            object_prefix: "uploads".to_string(),
            cache_control: "public, max-age=31536000".to_string(),
            chunk_size_bytes: config.chunk_size_bytes,
            retry_delays_ms: config.retry_delays_ms.clone(),
            max_file_bytes: config.max_upload_bytes,
        }
    }
}

/// Chunked, resumable upload pipeline.
pub struct ResumableUploadSession {
    transport: Arc<dyn UploadTransport>,
    auth: Arc<dyn AuthProvider>,
    config: UploadSessionConfig,
}

impl ResumableUploadSession {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        auth: Arc<dyn AuthProvider>,
        config: UploadSessionConfig,
    ) -> Self {
        Self {
            transport,
            auth,
            config,
        }
    }

    /// Upload a source end to end.
    ///
    /// There is no whole-session auto-retry beyond the chunk-level backoff
    /// schedule: a failure rejects with the underlying error and the caller
    /// owns any user-facing retry.
    pub async fn upload(
        &self,
        source: &UploadSource,
        callbacks: &UploadCallbacks,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, UploadError> {
        match self.run(source, callbacks, cancel).await {
            Ok(stored) => {
                callbacks.phase(UploadPhase::Completed);
                tracing::info!(
                    stored_path = %stored.stored_path,
                    content_type = %stored.content_type,
                    "Upload completed"
                );
                Ok(stored)
            }
            Err(error) => {
                callbacks.phase(UploadPhase::Failed);
                tracing::warn!(error = %error, "Upload failed");
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        source: &UploadSource,
        callbacks: &UploadCallbacks,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, UploadError> {
        // Preparing: size gate, content type, object name, fingerprint.
        callbacks.phase(UploadPhase::Preparing);

        let total_bytes = source.len().await?;
        if total_bytes == 0 {
            return Err(UploadError::EmptySource);
        }
        if total_bytes > self.config.max_file_bytes {
            return Err(UploadError::TooLarge {
                size: total_bytes,
                max: self.config.max_file_bytes,
            });
        }

        let head = source.head(SNIFF_LEN).await?;
        let content_type = content_type::sniff(&head, &source.name());
        let extension = content_type::extension_for(content_type);
        let object_name = format!("{}/{}.{}", self.config.object_prefix, Uuid::new_v4(), extension);
        let print = fingerprint(&source.name(), total_bytes);

        // Signing: credential plus endpoint session. A missing session is
        // fatal, no retry.
        callbacks.phase(UploadPhase::Signing);
        let token = self.auth.access_token().await?;

        callbacks.phase(UploadPhase::Uploading);

        let (handle, mut offset, object_name) =
            match self.transport.find_previous(&print, &token).await? {
                Some(prior) => {
                    tracing::info!(
                        fingerprint = %print,
                        committed_offset = prior.committed_offset,
                        "Resuming previous upload session"
                    );
                    (
                        prior.handle,
                        prior.committed_offset.min(total_bytes),
                        prior.object_name,
                    )
                }
                None => {
                    let metadata = UploadMetadata {
                        bucket: self.config.bucket.clone(),
                        object_name: object_name.clone(),
                        content_type: content_type.to_string(),
                        cache_control: self.config.cache_control.clone(),
                        total_bytes,
                        fingerprint: print.clone(),
                    };
                    let handle = self.transport.create_session(&metadata, &token).await?;
                    (handle, 0, object_name)
                }
            };

        callbacks.progress(offset, total_bytes);

        let mut stored_path: Option<String> = None;
        while offset < total_bytes {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            let want = (total_bytes - offset).min(self.config.chunk_size_bytes as u64) as usize;
            let chunk = source.read_chunk(offset, want).await?;
            if chunk.is_empty() {
                return Err(UploadError::Rejected(format!(
                    "source truncated at offset {offset}"
                )));
            }

            let ack = self
                .send_with_retry(&handle, &token, offset, chunk, total_bytes, cancel)
                .await?;

            if ack.committed_offset <= offset {
                return Err(UploadError::Rejected(format!(
                    "endpoint made no progress at offset {offset}"
                )));
            }
            offset = ack.committed_offset.min(total_bytes);
            if ack.stored_path.is_some() {
                stored_path = ack.stored_path;
            }

            callbacks.progress(offset, total_bytes);
        }

        Ok(StoredObject {
            stored_path: stored_path.unwrap_or(object_name),
            content_type: content_type.to_string(),
        })
    }

    /// Send one chunk, retrying transient failures per the backoff
    /// schedule. Cancellation aborts between and during attempts.
    async fn send_with_retry(
        &self,
        handle: &UploadHandle,
        token: &AuthToken,
        offset: u64,
        chunk: Bytes,
        total_bytes: u64,
        cancel: &CancellationToken,
    ) -> Result<ChunkAck, UploadError> {
        let mut last_error = None;

        for (attempt, delay_ms) in self.config.retry_delays_ms.iter().enumerate() {
            if *delay_ms > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(UploadError::Cancelled),
                    _ = tokio::time::sleep(Duration::from_millis(*delay_ms)) => {}
                }
            }

            let send = self
                .transport
                .put_chunk(handle, token, offset, chunk.clone(), total_bytes);
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(UploadError::Cancelled),
                result = send => result,
            };

            match result {
                Ok(ack) => return Ok(ack),
                Err(error) if error.is_transient() => {
                    tracing::warn!(
                        attempt,
                        offset,
                        error = %error,
                        "Transient chunk failure, will retry"
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error
            .unwrap_or_else(|| UploadError::Transport("retry schedule exhausted".to_string())))
    }
}
