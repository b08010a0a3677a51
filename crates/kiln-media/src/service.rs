//! Service wiring.
//!
//! Builds the concrete HTTP-backed implementations and injects them into
//! the feed and submission facades. Everything behind the facades is a
//! trait object, so tests wire mocks through the same constructors.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use kiln_core::clock::SystemClock;
use kiln_core::config::MediaConfig;
use kiln_delivery::{HttpSigningApi, HttpUrlWarmer, SignedUrlResolver, UrlWarmer};
use kiln_playback::{FeedController, PlayerRegistry};
use kiln_processing::{
    detect_capturer, FrameDecoder, HttpThumbnailStore, ThumbnailExtractor, ThumbnailStore,
};
use kiln_upload::{
    AuthProvider, HttpUploadTransport, ResumableUploadSession, UploadSessionConfig,
};

use crate::submission::SubmissionService;

const SIGNING_ENDPOINT: &str = "http://localhost:8080/api/signing";
const UPLOAD_ENDPOINT: &str = "http://localhost:8080/api/upload";
const STORAGE_ENDPOINT: &str = "http://localhost:8080/api/storage";
const STORAGE_BUCKET: &str = "media";

/// Where the HTTP-backed collaborators live.
#[derive(Clone, Debug)]
pub struct EndpointsConfig {
    pub signing_endpoint: String,
    pub upload_endpoint: String,
    pub storage_endpoint: String,
    pub storage_bucket: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            signing_endpoint: SIGNING_ENDPOINT.to_string(),
            upload_endpoint: UPLOAD_ENDPOINT.to_string(),
            storage_endpoint: STORAGE_ENDPOINT.to_string(),
            storage_bucket: STORAGE_BUCKET.to_string(),
        }
    }
}

impl EndpointsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            signing_endpoint: env::var("KILN_SIGNING_ENDPOINT")
                .unwrap_or(defaults.signing_endpoint),
            upload_endpoint: env::var("KILN_UPLOAD_ENDPOINT").unwrap_or(defaults.upload_endpoint),
            storage_endpoint: env::var("KILN_STORAGE_ENDPOINT")
                .unwrap_or(defaults.storage_endpoint),
            storage_bucket: env::var("KILN_STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
        }
    }
}

/// The assembled media core: one feed facade, one submission facade.
pub struct MediaService {
    pub feed: Arc<FeedController>,
    pub submission: Arc<SubmissionService>,
}

impl MediaService {
    /// Wire the HTTP-backed service graph.
    ///
    /// The auth provider comes from the host application (it owns the user
    /// session); the frame decoder is optional and only used when no ffmpeg
    /// binary is available.
    pub async fn initialize(
        config: MediaConfig,
        endpoints: EndpointsConfig,
        auth: Arc<dyn AuthProvider>,
        decoder: Option<Arc<dyn FrameDecoder>>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let signing_api = Arc::new(HttpSigningApi::new(
            client.clone(),
            endpoints.signing_endpoint.clone(),
        ));
        let warmer: Arc<dyn UrlWarmer> = Arc::new(HttpUrlWarmer::new(client.clone()));
        let resolver = SignedUrlResolver::new(signing_api, Arc::new(SystemClock), &config)
            .with_warmer(warmer);

        let registry = Arc::new(PlayerRegistry::new());
        let feed = Arc::new(FeedController::new(resolver, registry, &config));

        let transport = Arc::new(HttpUploadTransport::new(
            client.clone(),
            endpoints.upload_endpoint.clone(),
        ));
        let session =
            ResumableUploadSession::new(transport, auth, UploadSessionConfig::from_media(&config));

        let capturer =
            detect_capturer(&config.ffmpeg_path, config.thumbnail_seek_secs, decoder).await;
        let extractor = capturer.map(|capturer| {
            ThumbnailExtractor::new(
                capturer,
                Duration::from_secs(config.thumbnail_timeout_secs),
            )
        });
        let store: Arc<dyn ThumbnailStore> = Arc::new(HttpThumbnailStore::new(
            client,
            endpoints.storage_endpoint.clone(),
            endpoints.storage_bucket.clone(),
        ));
        let submission = Arc::new(SubmissionService::new(session, extractor, store));

        tracing::info!(
            signing_endpoint = %endpoints.signing_endpoint,
            upload_endpoint = %endpoints.upload_endpoint,
            "Media service initialized"
        );

        Ok(Self { feed, submission })
    }
}
