//! Kiln Processing Library
//!
//! Still-frame thumbnail extraction from uploaded video: pluggable frame
//! capture strategies behind one trait, a timeout-bounded extractor that
//! never fails the parent upload, and storage of the captured frame.

pub mod store;
pub mod thumbnail;

// Re-export commonly used types
pub use store::{HttpThumbnailStore, ThumbnailStore};
pub use thumbnail::decoder::{DecodedFrame, DecoderFrameCapturer, FrameDecoder, FrameStream};
pub use thumbnail::ffmpeg::FfmpegFrameCapturer;
pub use thumbnail::{detect_capturer, FrameCapturer, Thumbnail, ThumbnailError, ThumbnailExtractor};
