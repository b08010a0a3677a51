//! Decoder-pipeline capture strategy.
//!
//! Drives a pluggable [`FrameDecoder`] that yields decoded RGBA frames as a
//! stream. The capturer takes the first frame at or after the seek offset,
//! or the last frame seen when the stream ends early, and JPEG-encodes it.

use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use image::codecs::jpeg::JpegEncoder;

use crate::thumbnail::{FrameCapturer, Thumbnail, ThumbnailError};

const JPEG_QUALITY: u8 = 85;

/// One decoded frame, 8-bit RGBA.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Bytes,
    pub timestamp_secs: f64,
}

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<DecodedFrame, ThumbnailError>> + Send>>;

/// Event-driven video decoder yielding frames in presentation order.
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    async fn open(&self, path: &Path) -> Result<FrameStream, ThumbnailError>;
}

/// Frame capture through a [`FrameDecoder`] stream.
pub struct DecoderFrameCapturer {
    decoder: std::sync::Arc<dyn FrameDecoder>,
    seek_secs: f64,
}

impl DecoderFrameCapturer {
    pub fn new(decoder: std::sync::Arc<dyn FrameDecoder>, seek_secs: f64) -> Self {
        Self {
            decoder,
            seek_secs: seek_secs.max(0.0),
        }
    }

    fn encode(frame: DecodedFrame) -> Result<Thumbnail, ThumbnailError> {
        let rgba = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.to_vec())
            .ok_or_else(|| {
                ThumbnailError::Decode(format!(
                    "frame buffer does not match {}x{}",
                    frame.width, frame.height
                ))
            })?;
        let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

        let mut data = Vec::new();
        let mut cursor = Cursor::new(&mut data);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)
            .map_err(|e| ThumbnailError::Decode(format!("JPEG encode failed: {e}")))?;

        Ok(Thumbnail::from_dimensions(
            Bytes::from(data),
            frame.width,
            frame.height,
        ))
    }
}

#[async_trait]
impl FrameCapturer for DecoderFrameCapturer {
    async fn capture_frame(&self, path: &Path) -> Result<Thumbnail, ThumbnailError> {
        // The stream (and the decoder resources behind it) drops on every
        // exit path of this scope.
        let mut frames = self.decoder.open(path).await?;

        let mut last_seen: Option<DecodedFrame> = None;
        while let Some(frame) = frames.next().await {
            let frame = frame?;
            if frame.timestamp_secs >= self.seek_secs {
                return Self::encode(frame);
            }
            last_seen = Some(frame);
        }

        match last_seen {
            Some(frame) => Self::encode(frame),
            None => Err(ThumbnailError::Decode(
                "stream ended without a decodable frame".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn solid_frame(timestamp_secs: f64, width: u32, height: u32) -> DecodedFrame {
        DecodedFrame {
            width,
            height,
            rgba: Bytes::from(vec![0x7fu8; (width * height * 4) as usize]),
            timestamp_secs,
        }
    }

    struct FixedDecoder {
        frames: Vec<DecodedFrame>,
    }

    #[async_trait]
    impl FrameDecoder for FixedDecoder {
        async fn open(&self, _path: &Path) -> Result<FrameStream, ThumbnailError> {
            Ok(Box::pin(futures::stream::iter(
                self.frames.clone().into_iter().map(Ok),
            )))
        }
    }

    #[tokio::test]
    async fn takes_the_first_frame_at_or_after_the_seek_offset() {
        let decoder = Arc::new(FixedDecoder {
            frames: vec![
                solid_frame(0.0, 4, 2),
                solid_frame(0.5, 4, 2),
                solid_frame(1.2, 8, 4),
            ],
        });
        let capturer = DecoderFrameCapturer::new(decoder, 1.0);

        let thumbnail = capturer
            .capture_frame(Path::new("/tmp/clip.mp4"))
            .await
            .unwrap();

        assert_eq!((thumbnail.width, thumbnail.height), (8, 4));
        assert!(!thumbnail.image_data.is_empty());
    }

    #[tokio::test]
    async fn short_stream_falls_back_to_the_last_frame() {
        let decoder = Arc::new(FixedDecoder {
            frames: vec![solid_frame(0.0, 4, 2), solid_frame(0.3, 6, 2)],
        });
        let capturer = DecoderFrameCapturer::new(decoder, 1.0);

        let thumbnail = capturer
            .capture_frame(Path::new("/tmp/clip.mp4"))
            .await
            .unwrap();

        assert_eq!((thumbnail.width, thumbnail.height), (6, 2));
    }

    #[tokio::test]
    async fn empty_stream_is_a_decode_error() {
        let decoder = Arc::new(FixedDecoder { frames: Vec::new() });
        let capturer = DecoderFrameCapturer::new(decoder, 1.0);

        let error = capturer
            .capture_frame(Path::new("/tmp/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(error, ThumbnailError::Decode(_)));
    }

    #[tokio::test]
    async fn mismatched_buffer_is_a_decode_error() {
        let decoder = Arc::new(FixedDecoder {
            frames: vec![DecodedFrame {
                width: 10,
                height: 10,
                rgba: Bytes::from_static(&[0u8; 4]),
                timestamp_secs: 2.0,
            }],
        });
        let capturer = DecoderFrameCapturer::new(decoder, 1.0);

        let error = capturer
            .capture_frame(Path::new("/tmp/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(error, ThumbnailError::Decode(_)));
    }

    struct StuckDecoder;

    #[async_trait]
    impl FrameDecoder for StuckDecoder {
        async fn open(&self, _path: &Path) -> Result<FrameStream, ThumbnailError> {
            Ok(Box::pin(futures::stream::pending()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_decoder_is_bounded_by_the_extractor_timeout() {
        use crate::thumbnail::ThumbnailExtractor;
        use std::time::Duration;

        let capturer = Arc::new(DecoderFrameCapturer::new(Arc::new(StuckDecoder), 1.0));
        let extractor = ThumbnailExtractor::new(capturer, Duration::from_secs(10));

        assert!(extractor.capture(Path::new("/tmp/clip.mp4")).await.is_none());
    }
}
