//! Kiln Playback Library
//!
//! Enforces the feed's "at most one media item plays at a time" contract.
//! The [`PlayerRegistry`] is the directory of playback handles, the
//! [`ActiveItemSelector`] picks the active row from scroll geometry, and the
//! [`FeedController`] ties both to the signed-URL resolver as the facade the
//! feed renderer talks to.

pub mod feed;
pub mod registry;
pub mod selector;

// Re-export commonly used types
pub use feed::FeedController;
pub use registry::{PlaybackError, PlayerHandle, PlayerRegistry};
pub use selector::ActiveItemSelector;
