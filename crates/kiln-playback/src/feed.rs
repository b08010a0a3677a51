//! Feed playback facade.
//!
//! The `FeedController` is what the feed renderer talks to: it resolves
//! playable URLs for rows, tracks row layout and scroll position, decides
//! which row is active, and sweeps a pause across everything else the moment
//! the active row changes.

use std::sync::{Arc, Mutex};

use kiln_core::config::MediaConfig;
use kiln_core::models::{LayoutRecord, MediaAsset};
use kiln_core::variant::pick_playable;
use kiln_delivery::{SignedUrlResolver, SigningError};

use crate::registry::{PlayerHandle, PlayerRegistry};
use crate::selector::ActiveItemSelector;

struct FeedState {
    selector: ActiveItemSelector,
    active_id: Option<String>,
    seed_id: Option<String>,
    scroll_offset: f64,
    viewport_height: f64,
}

/// Facade over resolver, registry, and selector for one feed surface.
pub struct FeedController {
    resolver: SignedUrlResolver,
    registry: Arc<PlayerRegistry>,
    state: Mutex<FeedState>,
    ttl_secs: u64,
    seed_threshold: f64,
}

impl FeedController {
    pub fn new(
        resolver: SignedUrlResolver,
        registry: Arc<PlayerRegistry>,
        config: &MediaConfig,
    ) -> Self {
        Self {
            resolver,
            registry,
            state: Mutex::new(FeedState {
                selector: ActiveItemSelector::new(),
                active_id: None,
                seed_id: None,
                scroll_offset: 0.0,
                viewport_height: 0.0,
            }),
            ttl_secs: config.signed_url_ttl_secs,
            seed_threshold: config.visibility_seed_threshold,
        }
    }

    /// Resolve the playable URL for an asset: variant selection picks the
    /// cheapest rendition, the resolver signs (or serves from cache).
    /// A `SigningError` degrades this one row to a placeholder.
    pub async fn resolve_playable_url(&self, asset: &MediaAsset) -> Result<String, SigningError> {
        let playable = pick_playable(asset);
        self.resolver.resolve(&playable.path, self.ttl_secs).await
    }

    pub fn register_player(&self, id: impl Into<String>, handle: Arc<dyn PlayerHandle>) {
        self.registry.register(id, handle);
    }

    /// Unregister a row on unmount: its handle, its layout, and its claim
    /// on the active slot.
    pub fn unregister_player(&self, id: &str) {
        self.registry.unregister(id);
        let mut state = self.state.lock().expect("feed state lock poisoned");
        state.selector.remove_layout(id);
        if state.active_id.as_deref() == Some(id) {
            state.active_id = None;
        }
        if state.seed_id.as_deref() == Some(id) {
            state.seed_id = None;
        }
    }

    /// Record a row's geometry from the layout pass.
    pub fn report_layout(&self, id: impl Into<String>, offset_y: f64, height: f64, playable: bool) {
        let mut state = self.state.lock().expect("feed state lock poisoned");
        state.selector.report_layout(LayoutRecord {
            id: id.into(),
            offset_y,
            height,
            playable,
        });
    }

    pub fn set_viewport_height(&self, viewport_height: f64) {
        let mut state = self.state.lock().expect("feed state lock poisoned");
        state.viewport_height = viewport_height;
    }

    /// Per-scroll-frame check: recompute the active row and switch the
    /// instant a closer one exists.
    pub async fn on_scroll(&self, scroll_offset: f64) {
        let decision = {
            let mut state = self.state.lock().expect("feed state lock poisoned");
            state.scroll_offset = scroll_offset;
            Self::evaluate(&mut state)
        };
        self.apply(decision).await;
    }

    /// Momentum-end check: re-run the same computation once fast scrolling
    /// settles, correcting any frame-coalescing drift from per-frame checks.
    pub async fn on_momentum_end(&self) {
        let decision = {
            let mut state = self.state.lock().expect("feed state lock poisoned");
            Self::evaluate(&mut state)
        };
        self.apply(decision).await;
    }

    /// Viewport-intersection signal. Used only to seed the very first
    /// active item before any layout has been recorded; once layout data
    /// exists, geometry distance is authoritative.
    pub fn on_viewability(&self, id: &str, visible_fraction: f64) {
        let mut state = self.state.lock().expect("feed state lock poisoned");
        if state.selector.has_layout() || state.seed_id.is_some() {
            return;
        }
        if visible_fraction < self.seed_threshold {
            return;
        }
        tracing::debug!(row_id = %id, visible_fraction, "Seeding first active item from viewability");
        state.seed_id = Some(id.to_string());
        state.active_id = Some(id.to_string());
    }

    /// Currently active row id, if any.
    pub fn active_id(&self) -> Option<String> {
        self.state
            .lock()
            .expect("feed state lock poisoned")
            .active_id
            .clone()
    }

    /// Recompute the active row under the lock. Returns the pause-sweep
    /// target when the active id changed, `None` when nothing to do.
    /// Change-detection is the light debounce that keeps rapid scroll
    /// frames from turning into pause storms.
    fn evaluate(state: &mut FeedState) -> Option<Option<String>> {
        if !state.selector.has_layout() {
            // Scroll fired before any row reported layout. Benign; the next
            // layout pass corrects it. Keep the viewability seed active.
            return None;
        }

        let picked = state
            .selector
            .pick_active_by_center(state.scroll_offset, state.viewport_height)
            .map(str::to_string);

        if picked == state.active_id {
            return None;
        }

        tracing::debug!(
            previous = state.active_id.as_deref().unwrap_or("-"),
            next = picked.as_deref().unwrap_or("-"),
            "Active feed item changed"
        );
        state.active_id = picked.clone();
        Some(picked)
    }

    async fn apply(&self, decision: Option<Option<String>>) {
        if let Some(target) = decision {
            self.registry.pause_all_except(target.as_deref()).await;
        }
    }
}
