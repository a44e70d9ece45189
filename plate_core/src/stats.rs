use crate::{PlateStore, StyleKey};

/// One legend row: a label, its swatch style and how many wells across all
/// five grids carry that exact label. Derived on every render, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    pub style: StyleKey,
    pub count: usize,
}

/// Scans the whole store and groups filled wells by label.
///
/// Formats are visited smallest-first, wells row-major, so the output order
/// is first-seen and stable. When the same label was assigned different
/// styles over time the first-seen style represents the group; first-seen is
/// a deliberate, deterministic tie-break rather than whatever the iteration
/// happened to visit last.
pub fn aggregate(store: &PlateStore) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = Vec::new();
    for (_, grid) in store.iter() {
        for well in &grid.wells {
            if !well.is_filled() {
                continue;
            }
            match entries.iter_mut().find(|e| e.label == well.label) {
                Some(entry) => entry.count += 1,
                None => entries.push(LegendEntry {
                    label: well.label.clone(),
                    style: well.color.clone(),
                    count: 1,
                }),
            }
        }
    }
    entries
}

/// Column count for the legend layout, driven by how many groups exist.
pub fn legend_columns(entry_count: usize) -> usize {
    if entry_count <= 10 {
        2
    } else if entry_count <= 24 {
        4
    } else {
        5
    }
}
