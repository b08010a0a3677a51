//! Thumbnail extraction.
//!
//! A [`FrameCapturer`] grabs one representative frame from a video file.
//! Two strategies exist: an event-driven decoder pipeline and an ffmpeg
//! frame-grab, picked once at startup by [`detect_capturer`]. The
//! [`ThumbnailExtractor`] bounds whichever strategy is active with a timeout
//! and reports failure as `None` so a missing thumbnail never fails the
//! surrounding submission.

pub mod decoder;
pub mod ffmpeg;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::thumbnail::decoder::{DecoderFrameCapturer, FrameDecoder};
use crate::thumbnail::ffmpeg::FfmpegFrameCapturer;

/// Thumbnail pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("invalid source path: {0}")]
    InvalidPath(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("frame decode failed: {0}")]
    Decode(String),

    #[error("thumbnail store failed: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One captured still frame, JPEG-encoded.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    pub image_data: Bytes,
    pub width: u32,
    pub height: u32,
    /// Natural width/height ratio of the source frame.
    pub aspect_ratio: f64,
}

impl Thumbnail {
    pub(crate) fn from_dimensions(image_data: Bytes, width: u32, height: u32) -> Self {
        let aspect_ratio = if height == 0 {
            1.0
        } else {
            width as f64 / height as f64
        };
        Self {
            image_data,
            width,
            height,
            aspect_ratio,
        }
    }
}

/// Strategy for grabbing one frame from a video file.
#[async_trait]
pub trait FrameCapturer: Send + Sync {
    async fn capture_frame(&self, path: &Path) -> Result<Thumbnail, ThumbnailError>;
}

/// Pick a capture strategy for this environment.
///
/// Prefers the ffmpeg frame-grab when the binary answers `-version`; falls
/// back to the decoder pipeline when one is wired in. `None` means the
/// environment cannot produce thumbnails at all and callers skip extraction.
pub async fn detect_capturer(
    ffmpeg_path: &str,
    seek_secs: f64,
    decoder: Option<Arc<dyn FrameDecoder>>,
) -> Option<Arc<dyn FrameCapturer>> {
    if ffmpeg::is_available(ffmpeg_path).await {
        match FfmpegFrameCapturer::new(ffmpeg_path.to_string(), seek_secs) {
            Ok(capturer) => {
                tracing::info!(ffmpeg_path = %ffmpeg_path, "Using ffmpeg frame capture");
                return Some(Arc::new(capturer));
            }
            Err(error) => {
                tracing::warn!(error = %error, "Rejected ffmpeg path, trying decoder capture");
            }
        }
    }

    if let Some(decoder) = decoder {
        tracing::info!("Using decoder frame capture");
        return Some(Arc::new(DecoderFrameCapturer::new(decoder, seek_secs)));
    }

    tracing::warn!("No frame capture strategy available, thumbnails disabled");
    None
}

/// Timeout-bounded thumbnail extraction over the active capture strategy.
pub struct ThumbnailExtractor {
    capturer: Arc<dyn FrameCapturer>,
    timeout: Duration,
}

impl ThumbnailExtractor {
    pub fn new(capturer: Arc<dyn FrameCapturer>, timeout: Duration) -> Self {
        Self { capturer, timeout }
    }

    /// Capture one frame from `path`.
    ///
    /// Timeout and capture failures both come back as `None`; the caller
    /// proceeds without a thumbnail.
    pub async fn capture(&self, path: &Path) -> Option<Thumbnail> {
        match tokio::time::timeout(self.timeout, self.capturer.capture_frame(path)).await {
            Ok(Ok(thumbnail)) => {
                tracing::debug!(
                    path = %path.display(),
                    width = thumbnail.width,
                    height = thumbnail.height,
                    "Captured thumbnail frame"
                );
                Some(thumbnail)
            }
            Ok(Err(error)) => {
                tracing::debug!(path = %path.display(), error = %error, "Thumbnail capture failed");
                None
            }
            Err(_) => {
                tracing::debug!(
                    path = %path.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Thumbnail capture timed out"
                );
                None
            }
        }
    }
}
