//! Upload error types.

/// Upload failures. Surfaced to the user with a manual retry affordance; no
/// partial submission record is created on failure.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// No authenticated session. Fatal to the attempt, never retried.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error("file too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("empty upload source")]
    EmptySource,

    /// Transient transport failure (network, timeout). Retried per the
    /// chunk backoff schedule before the session fails.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The upload endpoint rejected the request in a way a retry cannot
    /// fix (bad metadata, revoked credential mid-flight).
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the chunk-level backoff schedule applies. Everything else
    /// fails the session immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, UploadError::Transport(_) | UploadError::Io(_))
    }
}
