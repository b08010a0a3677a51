//! Submission facade.
//!
//! What the submission flow talks to: upload a recording end to end and,
//! best effort, produce a stored thumbnail for it. A missing thumbnail
//! never fails the submission; upload failures surface to the user with a
//! manual retry affordance.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use kiln_core::models::StoredObject;
use kiln_processing::{ThumbnailExtractor, ThumbnailStore};
use kiln_upload::{ResumableUploadSession, UploadCallbacks, UploadError, UploadSource};

/// A captured frame that has been stored, ready to attach to a submission.
#[derive(Clone, Debug)]
pub struct StoredThumbnail {
    pub url: String,
    pub aspect_ratio: f64,
}

/// Upload plus best-effort thumbnail extraction for one submission.
pub struct SubmissionService {
    session: ResumableUploadSession,
    /// Absent when no capture strategy exists in this environment.
    extractor: Option<ThumbnailExtractor>,
    store: Arc<dyn ThumbnailStore>,
}

impl SubmissionService {
    pub fn new(
        session: ResumableUploadSession,
        extractor: Option<ThumbnailExtractor>,
        store: Arc<dyn ThumbnailStore>,
    ) -> Self {
        Self {
            session,
            extractor,
            store,
        }
    }

    /// Capture and store a still frame for the video at `path`.
    ///
    /// Every failure path (no strategy, capture timeout, store error)
    /// returns `None` and the submission proceeds with a placeholder.
    pub async fn extract_thumbnail(&self, path: &Path) -> Option<StoredThumbnail> {
        let extractor = self.extractor.as_ref()?;
        let thumbnail = extractor.capture(path).await?;

        let object_path = format!("thumbnails/{}.jpg", Uuid::new_v4());
        match self
            .store
            .store(&object_path, thumbnail.image_data.clone(), "image/jpeg")
            .await
        {
            Ok(url) => Some(StoredThumbnail {
                url,
                aspect_ratio: thumbnail.aspect_ratio,
            }),
            Err(error) => {
                tracing::debug!(error = %error, "Thumbnail store failed, proceeding without");
                None
            }
        }
    }

    /// Upload a recording. Chunked and resumable; see
    /// [`ResumableUploadSession`] for retry and cancellation semantics.
    pub async fn upload_file(
        &self,
        source: &UploadSource,
        callbacks: &UploadCallbacks,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, UploadError> {
        self.session.upload(source, callbacks, cancel).await
    }
}
