//! Player handle registry.
//!
//! A process-wide directory of playback handles. The registry never tracks
//! which item is active; it only knows how to pause everyone except a given
//! id. Pausing an already-paused handle is idempotent, so overlapping
//! pause sweeps during fast scrolling are safe.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;

/// Playback control failures. Scoped to a single handle; a pause sweep
/// never fails as a whole.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaybackError {
    #[error("pause failed: {0}")]
    Pause(String),
}

/// A playback handle registered by a mounted, playable feed row.
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    async fn pause(&self) -> Result<(), PlaybackError>;
}

/// Directory of registered playback handles.
///
/// Constructed once per feed surface and shared via `Arc`; tests build
/// isolated instances.
#[derive(Default)]
pub struct PlayerRegistry {
    handles: Mutex<HashMap<String, Arc<dyn PlayerHandle>>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under a row id, replacing any previous handle for
    /// that id (a remounted row re-registers).
    pub fn register(&self, id: impl Into<String>, handle: Arc<dyn PlayerHandle>) {
        let id = id.into();
        self.handles
            .lock()
            .expect("player registry lock poisoned")
            .insert(id, handle);
    }

    /// Remove a handle on row unmount. Unknown ids are a no-op.
    pub fn unregister(&self, id: &str) {
        self.handles
            .lock()
            .expect("player registry lock poisoned")
            .remove(id);
    }

    /// Pause every registered handle except the one under `target_id`.
    ///
    /// `None` pauses everything (no item is active, e.g. the feed scrolled
    /// to an empty region). All pauses are awaited together and individual
    /// failures are logged and ignored: one stuck handle must not keep
    /// others playing or block the caller.
    pub async fn pause_all_except(&self, target_id: Option<&str>) {
        let to_pause: Vec<(String, Arc<dyn PlayerHandle>)> = {
            let handles = self.handles.lock().expect("player registry lock poisoned");
            handles
                .iter()
                .filter(|(id, _)| Some(id.as_str()) != target_id)
                .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
                .collect()
        };

        if to_pause.is_empty() {
            return;
        }

        let sweeps = to_pause.into_iter().map(|(id, handle)| async move {
            if let Err(error) = handle.pause().await {
                tracing::debug!(player_id = %id, error = %error, "Player pause failed");
            }
        });

        join_all(sweeps).await;
    }

    /// Number of registered handles. Mostly useful to tests and diagnostics.
    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .expect("player registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
