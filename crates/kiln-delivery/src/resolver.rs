//! Signed-URL resolution with caching and inflight coalescing.
//!
//! The resolver sits between feed rows and the signing API. Any number of
//! rows may ask for the same storage path at once; exactly one signing call
//! goes out and every requester shares its result. Successful results live
//! in a bounded LRU keyed by path and are reused until they come within a
//! safety margin of their expiry.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;

use kiln_core::clock::Clock;
use kiln_core::config::MediaConfig;

use crate::signing::{SigningApi, SigningError};

type SharedSign = Shared<BoxFuture<'static, Result<String, SigningError>>>;

/// Best-effort URL warm-up (network pre-connect / eager fetch) to reduce
/// first-play latency. Failures are ignored.
#[async_trait::async_trait]
pub trait UrlWarmer: Send + Sync {
    async fn warm(&self, url: String);
}

/// Warms a URL with an HTTP HEAD request.
pub struct HttpUrlWarmer {
    client: reqwest::Client,
}

impl HttpUrlWarmer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl UrlWarmer for HttpUrlWarmer {
    async fn warm(&self, url: String) {
        if let Err(error) = self.client.head(&url).send().await {
            tracing::debug!(error = %error, "URL warm-up failed");
        }
    }
}

struct CacheEntry {
    url: String,
    expires_at_ms: u64,
}

struct ResolverState {
    cache: LruCache<String, CacheEntry>,
    inflight: HashMap<String, SharedSign>,
}

enum Lookup {
    /// Live cache entry; no network work needed.
    Cached(String),
    /// Join a signing call, freshly started or already inflight.
    Join(SharedSign),
}

/// Cache + dedup layer over the signing API.
///
/// Constructed once and shared via `Arc`; tests build isolated instances
/// with their own mock API and clock.
#[derive(Clone)]
pub struct SignedUrlResolver {
    state: Arc<Mutex<ResolverState>>,
    api: Arc<dyn SigningApi>,
    clock: Arc<dyn Clock>,
    warmer: Option<Arc<dyn UrlWarmer>>,
    margin_ms: u64,
}

impl SignedUrlResolver {
    pub fn new(api: Arc<dyn SigningApi>, clock: Arc<dyn Clock>, config: &MediaConfig) -> Self {
        let capacity = NonZeroUsize::new(config.url_cache_capacity.max(1))
            .expect("cache capacity is at least one");
        Self {
            state: Arc::new(Mutex::new(ResolverState {
                cache: LruCache::new(capacity),
                inflight: HashMap::new(),
            })),
            api,
            clock,
            warmer: None,
            margin_ms: config.signed_url_margin_ms,
        }
    }

    /// Attach a best-effort URL warmer invoked after each fresh signing.
    pub fn with_warmer(mut self, warmer: Arc<dyn UrlWarmer>) -> Self {
        self.warmer = Some(warmer);
        self
    }

    /// Resolve a storage path into a playable URL.
    ///
    /// Returns the cached URL while `now < expires_at - margin`; otherwise
    /// joins the inflight signing call for the path, or starts one. There is
    /// no cancellation: a superseded request simply populates the cache for
    /// later use.
    pub async fn resolve(&self, path: &str, ttl_secs: u64) -> Result<String, SigningError> {
        match self.lookup_or_start(path, ttl_secs) {
            Lookup::Cached(url) => Ok(url),
            Lookup::Join(pending) => pending.await,
        }
    }

    /// Cache and inflight decisions happen under one lock with no await
    /// point inside, so every caller sees a consistent snapshot.
    fn lookup_or_start(&self, path: &str, ttl_secs: u64) -> Lookup {
        let mut state = self.state.lock().expect("resolver state lock poisoned");
        let now = self.clock.now_ms();

        if let Some(entry) = state.cache.get(path) {
            if now < entry.expires_at_ms.saturating_sub(self.margin_ms) {
                return Lookup::Cached(entry.url.clone());
            }
            tracing::debug!(path = %path, "Signed URL within safety margin of expiry, re-resolving");
        }

        if let Some(pending) = state.inflight.get(path) {
            return Lookup::Join(pending.clone());
        }

        let pending = self.start_signing(path.to_string(), ttl_secs);
        state.inflight.insert(path.to_string(), pending.clone());
        Lookup::Join(pending)
    }

    fn start_signing(&self, path: String, ttl_secs: u64) -> SharedSign {
        let api = Arc::clone(&self.api);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);
        let warmer = self.warmer.clone();

        async move {
            let signed = api.sign(&path, ttl_secs).await;

            let mut guard = state.lock().expect("resolver state lock poisoned");
            guard.inflight.remove(&path);
            match signed {
                Ok(signed) => {
                    let expires_at_ms = clock.now_ms() + ttl_secs * 1_000;
                    guard.cache.put(
                        path.clone(),
                        CacheEntry {
                            url: signed.url.clone(),
                            expires_at_ms,
                        },
                    );
                    drop(guard);

                    if let Some(warmer) = warmer {
                        let url = signed.url.clone();
                        tokio::spawn(async move {
                            warmer.warm(url).await;
                        });
                    }

                    Ok(signed.url)
                }
                Err(error) => {
                    drop(guard);
                    tracing::warn!(path = %path, error = %error, "Signing call failed");
                    Err(error)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Number of live plus stale entries currently cached. Test hook.
    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.state
            .lock()
            .expect("resolver state lock poisoned")
            .cache
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::SignedUrl;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn at(ms: u64) -> Arc<Self> {
            Arc::new(Self(AtomicU64::new(ms)))
        }

        fn set(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct CountingApi {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingApi {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SigningApi for CountingApi {
        async fn sign(&self, path: &str, _ttl_secs: u64) -> Result<SignedUrl, SigningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield once so concurrent requesters can observe the inflight
            // entry before the call completes.
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.fail {
                return Err(SigningError::Network("connection reset".to_string()));
            }
            Ok(SignedUrl {
                url: format!("https://cdn.example/{path}?sig=abc"),
                expires_at_ms: None,
            })
        }
    }

    fn resolver_with(api: Arc<CountingApi>, clock: Arc<ManualClock>) -> SignedUrlResolver {
        SignedUrlResolver::new(api, clock, &MediaConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_resolves_share_one_signing_call() {
        let api = Arc::new(CountingApi::new());
        let resolver = resolver_with(Arc::clone(&api), ManualClock::at(0));

        let (first, second) = tokio::join!(
            resolver.resolve("media/a.mp4", 180),
            resolver.resolve("media/a.mp4", 180),
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn different_paths_resolve_independently() {
        let api = Arc::new(CountingApi::new());
        let resolver = resolver_with(Arc::clone(&api), ManualClock::at(0));

        let (a, b) = tokio::join!(
            resolver.resolve("media/a.mp4", 180),
            resolver.resolve("media/b.mp4", 180),
        );

        assert!(a.unwrap().contains("media/a.mp4"));
        assert!(b.unwrap().contains("media/b.mp4"));
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_url_served_within_safety_margin() {
        let api = Arc::new(CountingApi::new());
        let clock = ManualClock::at(0);
        let resolver = resolver_with(Arc::clone(&api), Arc::clone(&clock));

        resolver.resolve("media/a.mp4", 180).await.unwrap();
        assert_eq!(api.calls(), 1);

        // ttl=180s, margin=30s: still live at +149s.
        clock.set(149_000);
        resolver.resolve("media/a.mp4", 180).await.unwrap();
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_triggers_fresh_signing() {
        let api = Arc::new(CountingApi::new());
        let clock = ManualClock::at(0);
        let resolver = resolver_with(Arc::clone(&api), Arc::clone(&clock));

        resolver.resolve("media/a.mp4", 180).await.unwrap();

        // Staleness starts at expires_at - margin = 150s; +170s must re-sign.
        clock.set(170_000);
        resolver.resolve("media/a.mp4", 180).await.unwrap();
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn staleness_boundary_is_inclusive() {
        let api = Arc::new(CountingApi::new());
        let clock = ManualClock::at(0);
        let resolver = resolver_with(Arc::clone(&api), Arc::clone(&clock));

        resolver.resolve("media/a.mp4", 180).await.unwrap();

        // now == expires_at - margin is already stale.
        clock.set(150_000);
        resolver.resolve("media/a.mp4", 180).await.unwrap();
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_inflight_and_allows_retry() {
        let api = Arc::new(CountingApi::failing());
        let resolver = resolver_with(Arc::clone(&api), ManualClock::at(0));

        assert!(resolver.resolve("media/a.mp4", 180).await.is_err());
        assert!(resolver.resolve("media/a.mp4", 180).await.is_err());

        // Each attempt issued its own call: the failed inflight entry was
        // removed, and nothing was cached.
        assert_eq!(api.calls(), 2);
        assert_eq!(resolver.cached_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn coalesced_failure_reaches_every_waiter() {
        let api = Arc::new(CountingApi::failing());
        let resolver = resolver_with(Arc::clone(&api), ManualClock::at(0));

        let (first, second) = tokio::join!(
            resolver.resolve("media/a.mp4", 180),
            resolver.resolve("media/a.mp4", 180),
        );

        assert!(first.is_err());
        assert!(second.is_err());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_capacity_is_bounded() {
        let api = Arc::new(CountingApi::new());
        let clock = ManualClock::at(0);
        let config = MediaConfig {
            url_cache_capacity: 2,
            ..MediaConfig::default()
        };
        let resolver = SignedUrlResolver::new(Arc::clone(&api) as Arc<dyn SigningApi>, clock, &config);

        resolver.resolve("media/a.mp4", 180).await.unwrap();
        resolver.resolve("media/b.mp4", 180).await.unwrap();
        resolver.resolve("media/c.mp4", 180).await.unwrap();
        assert_eq!(resolver.cached_len(), 2);

        // "a" was evicted; resolving it again is a fresh signing call.
        resolver.resolve("media/a.mp4", 180).await.unwrap();
        assert_eq!(api.calls(), 4);
    }

    struct NotifyingWarmer {
        warmed: tokio::sync::Notify,
        count: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl UrlWarmer for NotifyingWarmer {
        async fn warm(&self, _url: String) {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.warmed.notify_one();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn warms_url_after_fresh_signing() {
        let api = Arc::new(CountingApi::new());
        let warmer = Arc::new(NotifyingWarmer {
            warmed: tokio::sync::Notify::new(),
            count: AtomicUsize::new(0),
        });
        let resolver = resolver_with(Arc::clone(&api), ManualClock::at(0))
            .with_warmer(Arc::clone(&warmer) as Arc<dyn UrlWarmer>);

        resolver.resolve("media/a.mp4", 180).await.unwrap();
        warmer.warmed.notified().await;
        assert_eq!(warmer.count.load(Ordering::SeqCst), 1);

        // Cache hits don't re-warm.
        resolver.resolve("media/a.mp4", 180).await.unwrap();
        assert_eq!(warmer.count.load(Ordering::SeqCst), 1);
    }
}
