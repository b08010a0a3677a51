//! Feed row layout geometry.

/// Layout of one feed row, reported on every layout pass.
///
/// `offset_y` is the row's top edge in scroll-content coordinates. Rows that
/// are not playable (text posts, image-only posts) still report layout so the
/// selector sees a complete picture, but are never chosen as active.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRecord {
    pub id: String,
    pub offset_y: f64,
    pub height: f64,
    pub playable: bool,
}

impl LayoutRecord {
    /// Vertical midpoint of the row in scroll-content coordinates.
    pub fn midpoint(&self) -> f64 {
        self.offset_y + self.height * 0.5
    }
}
