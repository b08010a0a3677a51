//! Active item selection from scroll geometry.
//!
//! The active feed item is the playable row whose vertical midpoint is
//! closest to the viewport center. Rows report their layout on every layout
//! pass; records keep insertion order so the tie-break ("first encountered
//! wins") is stable and deterministic.

use std::collections::HashMap;

use kiln_core::models::LayoutRecord;

/// Geometry-driven selection of the active feed item.
#[derive(Default)]
pub struct ActiveItemSelector {
    records: Vec<LayoutRecord>,
    index: HashMap<String, usize>,
}

impl ActiveItemSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or update a row's layout. Updates keep the row's original
    /// insertion position so the tie-break stays stable across layout
    /// passes.
    pub fn report_layout(&mut self, record: LayoutRecord) {
        match self.index.get(&record.id) {
            Some(&position) => self.records[position] = record,
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Drop a row's layout on unmount.
    pub fn remove_layout(&mut self, id: &str) {
        if let Some(position) = self.index.remove(id) {
            self.records.remove(position);
            for slot in self.index.values_mut() {
                if *slot > position {
                    *slot -= 1;
                }
            }
        }
    }

    /// Whether any layout has been recorded yet. Before the first layout
    /// pass the viewability seed is the only signal available.
    pub fn has_layout(&self) -> bool {
        !self.records.is_empty()
    }

    /// Pick the playable row whose midpoint is closest to the viewport
    /// center. Returns `None` when no playable rows are recorded. On equal
    /// distances the first recorded row wins.
    pub fn pick_active_by_center(
        &self,
        scroll_offset: f64,
        viewport_height: f64,
    ) -> Option<&str> {
        let viewport_center = scroll_offset + viewport_height * 0.5;

        let mut best: Option<(&str, f64)> = None;
        for record in &self.records {
            if !record.playable {
                continue;
            }
            let distance = (record.midpoint() - viewport_center).abs();
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((record.id.as_str(), distance)),
            }
        }

        best.map(|(id, _)| id)
    }
}
