//! Kiln Upload Library
//!
//! Gets large video/audio files off the device reliably: chunked, resumable
//! uploads with progress reporting, a bounded retry schedule for transient
//! chunk failures, resume-from-previous-attempt by fingerprint, and explicit
//! cancellation.

pub mod auth;
pub mod content_type;
pub mod error;
pub mod fingerprint;
pub mod session;
pub mod source;
pub mod transport;

// Re-export commonly used types
pub use auth::{AuthProvider, AuthToken};
pub use error::UploadError;
pub use session::{
    ProgressFn, ResumableUploadSession, UploadCallbacks, UploadPhase, UploadSessionConfig,
};
pub use source::UploadSource;
pub use transport::{
    ChunkAck, HttpUploadTransport, PriorSession, UploadHandle, UploadMetadata, UploadTransport,
};
