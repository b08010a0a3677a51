//! Kiln Core Library
//!
//! This crate provides the shared domain models, configuration, clock
//! abstraction, variant selection, and RPC decoding used by the Kiln media
//! delivery and upload core.

pub mod clock;
pub mod config;
pub mod models;
pub mod rpc;
pub mod variant;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use config::MediaConfig;
pub use models::{LayoutRecord, MediaAsset, MediaKind, MediaVariant, PlayableRef, StoredObject};
pub use rpc::{decode_signed_url_envelope, DecodedSignedUrl, RpcShapeError};
pub use variant::pick_playable;
