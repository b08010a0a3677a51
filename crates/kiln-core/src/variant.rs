//! Variant selection.
//!
//! Picks the lowest-resolution playable variant of an asset to minimize feed
//! bandwidth. This is not user-selectable quality; the feed always plays the
//! cheapest rendition and the player upgrades nothing.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{MediaAsset, MediaKind, PlayableRef};

/// Sort key for variants whose label carries no parseable resolution.
/// They are treated as maximum resolution so they sort last.
const UNPARSEABLE_RESOLUTION: u32 = u32::MAX;

fn resolution_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)p").expect("valid resolution pattern"))
}

/// Parse the resolution out of a human variant label.
///
/// Matches a number immediately followed by `p` (e.g. "480p", "720P (hd)").
/// Labels without one sort as maximum resolution.
fn parse_resolution(label: &str) -> u32 {
    resolution_pattern()
        .captures(label)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(UNPARSEABLE_RESOLUTION)
}

/// Choose the playable path for an asset.
///
/// Audio assets and assets without variants resolve their primary storage
/// path directly. Otherwise the variant with the smallest parsed resolution
/// wins; on equal resolutions the first variant in list order wins. There is
/// no error condition: absence of parseable labels degrades to the primary
/// path ordering.
pub fn pick_playable(asset: &MediaAsset) -> PlayableRef {
    if asset.kind == MediaKind::Audio || asset.variants.is_empty() {
        return PlayableRef {
            path: asset.storage_path.clone(),
            thumbnail_path: asset.thumbnail_path.clone(),
        };
    }

    let mut best: Option<(&str, u32)> = None;
    for variant in &asset.variants {
        let resolution = parse_resolution(&variant.label);
        match best {
            Some((_, lowest)) if resolution >= lowest => {}
            _ => best = Some((&variant.path, resolution)),
        }
    }

    let path = best
        .map(|(path, _)| path.to_string())
        .unwrap_or_else(|| asset.storage_path.clone());

    PlayableRef {
        path,
        thumbnail_path: asset.thumbnail_path.clone(),
    }
}
