//! Upload credential provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::UploadError;

/// Short-lived bearer credential for the upload endpoint.
#[derive(Clone, Debug)]
pub struct AuthToken {
    pub bearer: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Source of upload credentials.
///
/// Implementations return [`UploadError::Unauthenticated`] when no
/// authenticated session exists; the session treats that as fatal with no
/// retry.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn access_token(&self) -> Result<AuthToken, UploadError>;
}
