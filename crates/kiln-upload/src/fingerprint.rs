//! Upload fingerprints.
//!
//! A fingerprint identifies the resumable state of a local file so a second
//! attempt against the same file continues instead of restarting. Name and
//! size are enough to key resumable state without reading the whole file;
//! a changed file changes its size and therefore its fingerprint.

use sha2::{Digest, Sha256};

const FINGERPRINT_SCHEME: &str = "kiln-upload/v1";

/// Compute the resumable-state fingerprint for a source.
pub fn fingerprint(name: &str, size: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_SCHEME.as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(size.to_be_bytes());
    hex::encode(hasher.finalize())
}
