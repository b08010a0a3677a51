//! Ffmpeg frame-grab capture strategy.
//!
//! Shells out to `ffmpeg -ss <seek> -frames:v 1` into a temp dir, then reads
//! the produced JPEG back for bytes and dimensions.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

use crate::thumbnail::{FrameCapturer, Thumbnail, ThumbnailError};

/// Reject paths with shell metacharacters or traversal sequences.
fn validate_path(path: &str) -> Result<(), ThumbnailError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ThumbnailError::InvalidPath(format!(
            "path contains dangerous characters: {path}"
        )));
    }
    if path.contains("..") {
        return Err(ThumbnailError::InvalidPath(format!(
            "path contains directory traversal: {path}"
        )));
    }
    Ok(())
}

fn validate_and_canonicalize_path(path: &Path) -> Result<PathBuf, ThumbnailError> {
    validate_path(&path.to_string_lossy())?;
    path.canonicalize()
        .map_err(|e| ThumbnailError::InvalidPath(format!("failed to canonicalize path: {e}")))
}

/// Whether the ffmpeg binary at `ffmpeg_path` is runnable.
pub async fn is_available(ffmpeg_path: &str) -> bool {
    if validate_path(ffmpeg_path).is_err() {
        return false;
    }
    Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Frame capture through the ffmpeg CLI.
pub struct FfmpegFrameCapturer {
    ffmpeg_path: String,
    seek_secs: f64,
}

impl FfmpegFrameCapturer {
    pub fn new(ffmpeg_path: String, seek_secs: f64) -> Result<Self, ThumbnailError> {
        validate_path(&ffmpeg_path)?;
        if !ffmpeg_path.chars().all(|c| {
            c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\'
        }) {
            return Err(ThumbnailError::InvalidPath(format!(
                "ffmpeg path contains unsafe characters: {ffmpeg_path}"
            )));
        }
        Ok(Self {
            ffmpeg_path,
            seek_secs: seek_secs.max(0.0),
        })
    }

    async fn grab(&self, input: &Path, output: &Path, seek_secs: f64) -> Result<(), ThumbnailError> {
        let result = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-ss", &format!("{seek_secs:.3}"), "-i"])
            .arg(input)
            .args(["-frames:v", "1", "-q:v", "3", "-y"])
            .arg(output)
            .output()
            .await
            .map_err(|e| ThumbnailError::Capture(format!("failed to execute ffmpeg: {e}")))?;

        if !result.status.success() {
            return Err(ThumbnailError::Capture(format!(
                "ffmpeg failed: {}",
                String::from_utf8_lossy(&result.stderr)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FrameCapturer for FfmpegFrameCapturer {
    async fn capture_frame(&self, path: &Path) -> Result<Thumbnail, ThumbnailError> {
        let input = validate_and_canonicalize_path(path)?;

        let temp_dir = tempfile::tempdir()?;
        let output = temp_dir.path().join("frame.jpg");

        self.grab(&input, &output, self.seek_secs).await?;

        // A clip shorter than the seek offset produces no frame; grab the
        // very first frame instead.
        if !output.exists() && self.seek_secs > 0.0 {
            self.grab(&input, &output, 0.0).await?;
        }
        if !output.exists() {
            return Err(ThumbnailError::Capture(
                "ffmpeg produced no output frame".to_string(),
            ));
        }

        let image_data = tokio::fs::read(&output).await?;
        let decoded = image::load_from_memory(&image_data)
            .map_err(|e| ThumbnailError::Decode(format!("unreadable ffmpeg output: {e}")))?;

        Ok(Thumbnail::from_dimensions(
            Bytes::from(image_data),
            decoded.width(),
            decoded.height(),
        ))
    }
}
