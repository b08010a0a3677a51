//! Domain models shared across the Kiln media core.

pub mod layout;
pub mod media;

pub use layout::LayoutRecord;
pub use media::{MediaAsset, MediaKind, MediaVariant, PlayableRef, StoredObject};
