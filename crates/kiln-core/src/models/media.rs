//! Media asset models.
//!
//! A `MediaAsset` is the stored reference a feed row receives from the data
//! API: a primary storage path plus the server-side transcode variants. It is
//! immutable once fetched and owned by the row that displays it.

use serde::{Deserialize, Serialize};

/// Kind of a media asset. Audio assets skip variant selection entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// An alternate encoding of the same asset at a different bitrate/resolution.
///
/// The `label` is a human-readable variant name coming from the transcoder
/// (e.g. "480p", "720p (hd)"). Resolution is parsed out of it; see
/// [`crate::variant`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaVariant {
    pub path: String,
    pub label: String,
}

/// A stored media reference as fetched from the data API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Primary storage path of the original object.
    pub storage_path: String,
    /// Server-side transcode variants, possibly empty.
    #[serde(default)]
    pub variants: Vec<MediaVariant>,
    /// Storage path of the poster/thumbnail image, if one exists.
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    pub kind: MediaKind,
}

/// The storage paths chosen for playback of an asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayableRef {
    /// Path to resolve into a signed playback URL.
    pub path: String,
    /// Path of the thumbnail to show before playback starts.
    pub thumbnail_path: Option<String>,
}

/// Final result of a completed upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Storage path of the uploaded object.
    pub stored_path: String,
    /// Content type the object was stored with.
    pub content_type: String,
}
