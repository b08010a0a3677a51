//! Kiln Media Library
//!
//! Composition layer over the media delivery and upload core: wires the
//! signed-URL resolver, feed playback facade, resumable uploads, and
//! thumbnail extraction into one service, and owns telemetry initialization
//! for binaries and tests.

pub mod service;
pub mod submission;
pub mod telemetry;

// Re-export the two public facades
pub use kiln_playback::FeedController;
pub use service::{EndpointsConfig, MediaService};
pub use submission::{StoredThumbnail, SubmissionService};
