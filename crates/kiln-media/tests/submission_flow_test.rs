//! Cross-component submission flow: chunked upload through the facade and
//! best-effort thumbnail extraction alongside it.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use kiln_media::telemetry::init_telemetry;
use kiln_media::SubmissionService;
use kiln_processing::{
    FrameCapturer, Thumbnail, ThumbnailError, ThumbnailExtractor, ThumbnailStore,
};
use kiln_upload::{
    AuthProvider, AuthToken, ChunkAck, PriorSession, ResumableUploadSession, UploadCallbacks,
    UploadError, UploadHandle, UploadMetadata, UploadSessionConfig, UploadSource, UploadTransport,
};

struct StubAuth;

#[async_trait]
impl AuthProvider for StubAuth {
    async fn access_token(&self) -> Result<AuthToken, UploadError> {
        Ok(AuthToken {
            bearer: "token".to_string(),
            expires_at: None,
        })
    }
}

#[derive(Default)]
struct RecordingTransport {
    chunks: Mutex<Vec<(u64, usize)>>,
    sessions: AtomicUsize,
}

#[async_trait]
impl UploadTransport for RecordingTransport {
    async fn create_session(
        &self,
        metadata: &UploadMetadata,
        _token: &AuthToken,
    ) -> Result<UploadHandle, UploadError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(UploadHandle {
            session_uri: format!("mock://sessions/{}", metadata.fingerprint),
        })
    }

    async fn find_previous(
        &self,
        _fingerprint: &str,
        _token: &AuthToken,
    ) -> Result<Option<PriorSession>, UploadError> {
        Ok(None)
    }

    async fn put_chunk(
        &self,
        _handle: &UploadHandle,
        _token: &AuthToken,
        offset: u64,
        chunk: Bytes,
        total_bytes: u64,
    ) -> Result<ChunkAck, UploadError> {
        self.chunks.lock().unwrap().push((offset, chunk.len()));
        let committed_offset = offset + chunk.len() as u64;
        let stored_path = (committed_offset >= total_bytes)
            .then(|| "media/uploads/final.mp4".to_string());
        Ok(ChunkAck {
            committed_offset,
            stored_path,
        })
    }
}

struct FixedCapturer;

#[async_trait]
impl FrameCapturer for FixedCapturer {
    async fn capture_frame(&self, _path: &Path) -> Result<Thumbnail, ThumbnailError> {
        Ok(Thumbnail {
            image_data: Bytes::from_static(b"jpeg-bytes"),
            width: 1280,
            height: 720,
            aspect_ratio: 1280.0 / 720.0,
        })
    }
}

#[derive(Default)]
struct RecordingStore {
    stored: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl ThumbnailStore for RecordingStore {
    async fn store(
        &self,
        object_path: &str,
        _data: Bytes,
        _content_type: &str,
    ) -> Result<String, ThumbnailError> {
        if self.fail {
            return Err(ThumbnailError::Store("bucket unavailable".to_string()));
        }
        self.stored.lock().unwrap().push(object_path.to_string());
        Ok(format!("https://cdn.example/{object_path}"))
    }
}

fn service(
    transport: Arc<RecordingTransport>,
    extractor: Option<ThumbnailExtractor>,
    store: Arc<RecordingStore>,
) -> SubmissionService {
    init_telemetry();
    let config = UploadSessionConfig {
        chunk_size_bytes: 8,
        retry_delays_ms: vec![0],
        ..UploadSessionConfig::default()
    };
    let session = ResumableUploadSession::new(transport, Arc::new(StubAuth), config);
    SubmissionService::new(session, extractor, store)
}

fn extractor() -> ThumbnailExtractor {
    ThumbnailExtractor::new(Arc::new(FixedCapturer), std::time::Duration::from_secs(10))
}

#[tokio::test]
async fn uploads_a_picked_file_in_chunks() {
    let mut file = tempfile::Builder::new()
        .suffix(".mp4")
        .tempfile()
        .unwrap();
    file.write_all(b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00abcdef")
        .unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(RecordingStore::default());
    let service = service(transport.clone(), None, store);

    let stored = service
        .upload_file(
            &UploadSource::file(file.path()),
            &UploadCallbacks::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(stored.stored_path, "media/uploads/final.mp4");
    assert_eq!(stored.content_type, "video/mp4");
    assert_eq!(transport.sessions.load(Ordering::SeqCst), 1);
    assert_eq!(
        *transport.chunks.lock().unwrap(),
        vec![(0, 8), (8, 8), (16, 6)]
    );
}

#[tokio::test]
async fn extracts_and_stores_a_thumbnail() {
    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(RecordingStore::default());
    let service = service(transport, Some(extractor()), store.clone());

    let thumbnail = service
        .extract_thumbnail(Path::new("/tmp/clip.mp4"))
        .await
        .unwrap();

    assert!(thumbnail.url.starts_with("https://cdn.example/thumbnails/"));
    assert!(thumbnail.url.ends_with(".jpg"));
    assert!((thumbnail.aspect_ratio - 16.0 / 9.0).abs() < 1e-9);
    assert_eq!(store.stored.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn thumbnail_store_failure_degrades_to_none() {
    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(RecordingStore {
        fail: true,
        ..RecordingStore::default()
    });
    let service = service(transport, Some(extractor()), store);

    assert!(service
        .extract_thumbnail(Path::new("/tmp/clip.mp4"))
        .await
        .is_none());
}

#[tokio::test]
async fn missing_capture_strategy_skips_thumbnails() {
    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(RecordingStore::default());
    let service = service(transport, None, store.clone());

    assert!(service
        .extract_thumbnail(Path::new("/tmp/clip.mp4"))
        .await
        .is_none());
    assert!(store.stored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_upload_surfaces_cancelled() {
    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(RecordingStore::default());
    let service = service(transport.clone(), None, store);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = service
        .upload_file(
            &UploadSource::bytes("clip.mp4", vec![0u8; 32]),
            &UploadCallbacks::default(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(error, UploadError::Cancelled));
    assert!(transport.chunks.lock().unwrap().is_empty());
}
